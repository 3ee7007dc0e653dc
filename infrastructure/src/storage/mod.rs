//! Conversation stores
//!
//! Implementations of the [`ConversationStore`](musing_application::ConversationStore)
//! port. The local directory store is always available; S3 is behind the
//! `s3` feature.

mod local;
#[cfg(feature = "s3")]
mod s3;

pub use local::LocalConversationStore;
#[cfg(feature = "s3")]
pub use s3::S3ConversationStore;
