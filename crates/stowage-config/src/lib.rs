//! Stowage Config
//!
//! This crate contains the serializable configuration that selects and
//! configures exactly one storage backend. It only describes backends; the
//! application turns a [`StorageConfig`] into a storage handle.
//!
//! Configuration is JSON, tagged by `backend`:
//!
//! ```json
//! { "backend": "filesystem", "base_dir": "/var/lib/stowage" }
//! { "backend": "object_storage", "connection": "s3://host:ak:sk:bucket", "domain": "cdn.example.com" }
//! ```
//!
//! A filesystem backend without `base_dir` uses an in-memory tree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid storage config: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Which backend to use and how to reach it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
  /// Files under a base directory, or in memory when no directory is given.
  Filesystem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_dir: Option<PathBuf>,
  },

  /// An S3-compatible bucket.
  ObjectStorage {
    /// `scheme://endpoint:accessKey:secretKey:bucket`
    connection: String,
    /// Public domain used by callers to build object URLs.
    #[serde(default)]
    domain: String,
  },
}

impl StorageConfig {
  /// Parse a configuration from a JSON string.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Load a configuration from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json(&content)
  }

  pub fn to_json(&self) -> Result<String, ConfigError> {
    Ok(serde_json::to_string_pretty(self)?)
  }
}

impl fmt::Debug for StorageConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      StorageConfig::Filesystem { base_dir } => f
        .debug_struct("Filesystem")
        .field("base_dir", base_dir)
        .finish(),
      // The connection string carries the secret key.
      StorageConfig::ObjectStorage { domain, .. } => f
        .debug_struct("ObjectStorage")
        .field("connection", &"<redacted>")
        .field("domain", domain)
        .finish(),
    }
  }
}
