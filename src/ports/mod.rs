//! Ports - trait interfaces between the core and its collaborators.
//!
//! Adapters implement these; the application layer depends only on the
//! traits.

mod delivery_channel;
mod generation_client;
mod identity;
mod media_storage;
mod message_store;

pub use delivery_channel::{ChannelClosed, DeliveryChannel};
pub use generation_client::{FragmentStream, GenerationClient, GenerationError};
pub use identity::{AuthError, IdentityProvider};
pub use media_storage::{MediaError, MediaStorage};
pub use message_store::{MessageStore, StoreError};
