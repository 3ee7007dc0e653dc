//! Local directory conversation store
//!
//! Keys are relative paths under a root directory, so the record for
//! `Default` lives at `<root>/conversations/Default.json`.

use async_trait::async_trait;
use musing_application::ports::conversation_store::{ConversationStore, StorageError};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LocalConversationStore {
    root: PathBuf,
}

impl LocalConversationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key below the root, refusing anything that could escape it.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(StorageError::InvalidName(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("{action} {}: {err}", path.display());
    match err.kind() {
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            StorageError::Unavailable(message)
        }
        _ => StorageError::Io(message),
    }
}

#[async_trait]
impl ConversationStore for LocalConversationStore {
    fn backend(&self) -> &str {
        "local"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("Could not create", parent, e))?;
        }

        // Write then rename so a crash never leaves a half-written record.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| io_error("Could not write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error("Could not replace", &path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Stored conversation record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("Could not read", &path, e)),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let (dir, file_prefix) = match prefix.rsplit_once('/') {
            Some((dir, rest)) => (dir, rest),
            None => ("", prefix),
        };
        let dir_path = if dir.is_empty() {
            self.root.clone()
        } else {
            self.path_for(dir)?
        };

        let mut entries = match tokio::fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("Could not list", &dir_path, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error("Could not list", &dir_path, e))?
        {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_file && name.starts_with(file_prefix) && !name.ends_with(".tmp") {
                keys.push(if dir.is_empty() {
                    name
                } else {
                    format!("{dir}/{name}")
                });
            }
        }
        keys.sort();
        Ok(keys)
    }
}
