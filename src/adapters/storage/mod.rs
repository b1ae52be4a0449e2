//! Filesystem storage adapters.

mod local_media;

pub use local_media::LocalMediaStorage;
