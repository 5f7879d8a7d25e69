//! Configuration loading.
//!
//! A [`TaskdeckConfig`] is read from TOML and turned into a ready
//! [`TaskStoreClient`] with [`connect`](TaskdeckConfig::connect):
//!
//! ```toml
//! collection = "tasks"
//! request_timeout_ms = 5000
//! log_filter = "taskdeck=info"
//!
//! [backend]
//! kind = "redis"
//! url = "redis://127.0.0.1:6379"
//! prefix = "taskdeck"
//!
//! [identity]
//! uid = "local"
//! display_name = "Local User"
//! ```
//!
//! Every key is optional. An empty file selects the in-memory backend.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taskdeck_store::{DocumentError, DocumentStore, InMemoryDocumentStore};
use thiserror::Error;

use crate::client::{TaskStoreClient, DEFAULT_COLLECTION};
use crate::session::{Identity, StaticIdentityProvider};

/// Errors raised while loading configuration or connecting a backend.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for [`TaskdeckConfig`].
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configured backend could not be reached.
    #[error("failed to connect backend: {0}")]
    Backend(#[from] DocumentError),

    /// The configured backend needs a cargo feature this build lacks.
    #[error("backend requires the `{feature}` feature")]
    FeatureDisabled {
        /// The missing feature.
        feature: &'static str,
    },
}

/// Document store selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local store; contents are lost on exit.
    #[default]
    Memory,
    /// Redis store (requires the `redis` feature).
    Redis {
        /// Connection URL.
        url: String,
        /// Key prefix shared by every collection.
        #[serde(default = "default_prefix")]
        prefix: String,
    },
}

fn default_prefix() -> String {
    "taskdeck".to_string()
}

/// Fixed identity for local single-user runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// uid used as the owner of created tasks.
    pub uid: String,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl From<IdentityConfig> for Identity {
    fn from(config: IdentityConfig) -> Self {
        Self {
            uid: config.uid,
            display_name: config.display_name,
            email: config.email,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskdeckConfig {
    /// Collection holding task records.
    pub collection: String,
    /// Per-call store deadline in milliseconds. Unset means no deadline.
    pub request_timeout_ms: Option<u64>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Document store selection.
    pub backend: BackendConfig,
    /// Optional fixed identity.
    pub identity: Option<IdentityConfig>,
}

impl Default for TaskdeckConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_string(),
            request_timeout_ms: None,
            log_filter: "taskdeck=info".to_string(),
            backend: BackendConfig::default(),
            identity: None,
        }
    }
}

impl TaskdeckConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] if the text is not valid configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use taskdeck::config::{BackendConfig, TaskdeckConfig};
    ///
    /// let config = TaskdeckConfig::from_toml_str("request_timeout_ms = 250").unwrap();
    /// assert_eq!(config.collection, "tasks");
    /// assert_eq!(config.backend, BackendConfig::Memory);
    /// assert_eq!(config.request_timeout().map(|d| d.as_millis()), Some(250));
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The per-call deadline, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// A provider for the configured fixed identity, if any.
    pub fn identity_provider(&self) -> Option<StaticIdentityProvider> {
        self.identity
            .clone()
            .map(|config| StaticIdentityProvider::new(config.into()))
    }

    /// Builds the configured document store.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Backend`] if the store cannot be reached.
    /// - [`ConfigError::FeatureDisabled`] if the backend was compiled out.
    pub async fn document_store(&self) -> Result<Arc<dyn DocumentStore>, ConfigError> {
        match &self.backend {
            BackendConfig::Memory => Ok(Arc::new(InMemoryDocumentStore::new())),
            #[cfg(feature = "redis")]
            BackendConfig::Redis { url, prefix } => {
                let store = taskdeck_store::redis::RedisDocumentStore::new(url)
                    .await?
                    .with_prefix(prefix.clone());
                Ok(Arc::new(store))
            },
            #[cfg(not(feature = "redis"))]
            BackendConfig::Redis { .. } => Err(ConfigError::FeatureDisabled { feature: "redis" }),
        }
    }

    /// Builds the configured store and wraps it in a [`TaskStoreClient`].
    ///
    /// # Errors
    ///
    /// As [`document_store`](Self::document_store).
    pub async fn connect(&self) -> Result<TaskStoreClient, ConfigError> {
        let store = self.document_store().await?;
        let mut client = TaskStoreClient::new(store).with_collection(self.collection.clone());
        if let Some(timeout) = self.request_timeout() {
            client = client.with_timeout(timeout);
        }
        tracing::debug!(
            collection = %self.collection,
            backend = ?self.backend,
            "connected task store"
        );
        Ok(client)
    }
}
