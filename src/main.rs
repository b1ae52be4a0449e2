//! streamchat server entrypoint.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use streamchat::adapters::http::{app, AuthAppState, ChatAppState};
use streamchat::adapters::ollama::OllamaClient;
use streamchat::adapters::postgres::{PostgresIdentity, PostgresMessageStore};
use streamchat::adapters::storage::LocalMediaStorage;
use streamchat::application::{AuthService, ChatSessionService, StreamTimeouts, TokenIssuer};
use streamchat::config::AppConfig;
use streamchat::ports::{GenerationClient, IdentityProvider, MediaStorage, MessageStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database migrations applied");
    }

    let store: Arc<dyn MessageStore> = Arc::new(PostgresMessageStore::new(pool.clone()));
    let identity: Arc<dyn IdentityProvider> = Arc::new(PostgresIdentity::new(pool));
    let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(&config.media.root));
    let generator: Arc<dyn GenerationClient> = Arc::new(OllamaClient::new(&config.generation));

    let tokens = Arc::new(TokenIssuer::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_secs,
    ));
    let auth = Arc::new(AuthService::new(identity, (*tokens).clone()));
    let sessions = Arc::new(
        ChatSessionService::new(Arc::clone(&store), generator, media).with_timeouts(
            StreamTimeouts {
                first_fragment: config.generation.first_fragment_timeout(),
                idle_fragment: config.generation.idle_fragment_timeout(),
            },
        ),
    );

    let router = app(
        AuthAppState { auth },
        ChatAppState { store, sessions },
        tokens,
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, model = %config.generation.model, "streamchat listening");
    axum::serve(listener, router).await?;

    Ok(())
}
