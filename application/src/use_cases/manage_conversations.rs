//! Conversation archive use case.
//!
//! Saves, loads and lists persisted conversations on a
//! [`ConversationStore`]. Records are JSON at `conversations/<name>.json`;
//! saving overwrites (last write wins) and is retried on transient storage
//! errors.

use std::sync::Arc;

use musing_domain::conversation::record::RECORD_PREFIX;
use musing_domain::{
    Conversation, ConversationRecord, DomainError, name_from_key, record_key,
    validate_conversation_name,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_store::{ConversationStore, StorageError};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArchiveError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Save/load/list front end over a conversation store.
pub struct ConversationArchive {
    store: Arc<dyn ConversationStore>,
    retry: RetryPolicy,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ConversationArchive {
    pub fn new(store: Arc<dyn ConversationStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn backend(&self) -> &str {
        self.store.backend()
    }

    /// Persist `conversation` under `name`, overwriting any existing record.
    pub async fn save(&self, name: &str, conversation: &Conversation) -> Result<(), ArchiveError> {
        validate_conversation_name(name)?;
        let bytes = ConversationRecord::from_conversation(conversation)
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let key = record_key(name);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.put(&key, bytes.clone()).await {
                Ok(()) => break,
                Err(err) if err.is_transient() && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        "Saving '{}' to {} failed ({}), retrying in {:?}",
                        name,
                        self.store.backend(),
                        err,
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            "Saved '{}' ({} turns) to {} at {}",
            name,
            conversation.len(),
            self.store.backend(),
            key
        );
        self.conversation_logger
            .log(ConversationEvent::conversation_saved(
                name,
                self.store.backend(),
                conversation.len(),
            ));
        Ok(())
    }

    /// Load the conversation stored under `name`. `Ok(None)` when absent.
    pub async fn load(&self, name: &str) -> Result<Option<Conversation>, ArchiveError> {
        validate_conversation_name(name)?;
        let key = record_key(name);

        let Some(bytes) = self.store.get(&key).await? else {
            debug!("No stored conversation at {}", key);
            return Ok(None);
        };
        let record = ConversationRecord::from_json(&bytes)
            .map_err(|e| StorageError::Serialization(format!("{key}: {e}")))?;
        let conversation = record.into_conversation(name)?;

        info!(
            "Loaded '{}' ({} turns) from {}",
            name,
            conversation.len(),
            self.store.backend()
        );
        self.conversation_logger
            .log(ConversationEvent::conversation_loaded(
                name,
                self.store.backend(),
                conversation.len(),
            ));
        Ok(Some(conversation))
    }

    /// Names of all stored conversations, sorted. Empty if the backend
    /// cannot be listed.
    pub async fn list_names(&self) -> Vec<String> {
        let keys = match self.store.list(RECORD_PREFIX).await {
            Ok(keys) => keys,
            Err(err) => {
                warn!(
                    "Listing conversations on {} failed: {}",
                    self.store.backend(),
                    err
                );
                return Vec::new();
            }
        };

        let mut names: Vec<String> = keys
            .iter()
            .filter_map(|key| name_from_key(key))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
