//! Storage configuration from TOML (`[storage]` section)

use musing_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

use super::chat::invalid_enum;

/// Where conversations are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `<local_root>/conversations/` on disk
    Local,
    /// An S3 bucket
    S3,
    /// Persistence disabled
    None,
}

/// Raw storage configuration from TOML
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "s3"                     # "local", "s3", "none"
/// local_root = "."
/// s3_bucket = "my-llm-chats-bucket"
/// s3_region = "us-east-2"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    pub backend: String,
    pub local_root: String,
    pub s3_bucket: String,
    pub s3_region: String,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            backend: "local".to_string(),
            local_root: ".".to_string(),
            s3_bucket: "my-llm-chats-bucket".to_string(),
            s3_region: "us-east-2".to_string(),
        }
    }
}

impl FileStorageConfig {
    pub fn parse_backend(&self) -> (StorageBackend, Vec<ConfigIssue>) {
        let backend = match self.backend.trim().to_lowercase().as_str() {
            "local" | "fs" => StorageBackend::Local,
            "s3" => StorageBackend::S3,
            "none" | "off" => StorageBackend::None,
            _ => {
                return (
                    StorageBackend::Local,
                    vec![invalid_enum(
                        "storage.backend",
                        &self.backend,
                        &["local", "s3", "none"],
                    )],
                );
            }
        };

        let mut issues = Vec::new();
        if backend == StorageBackend::S3 && self.s3_bucket.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingValue {
                    field: "storage.s3_bucket".to_string(),
                    required_by: "storage.backend = \"s3\"".to_string(),
                },
                "storage.s3_bucket: a bucket name is required for the s3 backend",
            ));
        }
        (backend, issues)
    }
}
