//! Store configuration.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration for a terngraph store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory for the persistent index tiers. `None` keeps all indices
    /// in memory, which is useful for tests and throwaway imports.
    pub index_dir: Option<PathBuf>,
    /// Default data-model URI: the statement-hash salt and resource scope
    /// used when a statement does not carry its own data-model URI.
    pub data_model_uri: String,
    /// Whether statements that cannot be attributed to any resource are
    /// rejected. When `false` they are written without a resource hash and
    /// logged, so the relaxation never hides data loss silently.
    pub reject_unattributable: bool,
}

impl StoreConfig {
    /// Memory-only configuration with the given default data-model URI.
    pub fn in_memory(data_model_uri: impl Into<String>) -> Self {
        Self {
            index_dir: None,
            data_model_uri: data_model_uri.into(),
            reject_unattributable: true,
        }
    }

    /// Persistent configuration rooted at the given index directory.
    pub fn persistent(
        index_dir: impl Into<PathBuf>,
        data_model_uri: impl Into<String>,
    ) -> Self {
        Self {
            index_dir: Some(index_dir.into()),
            data_model_uri: data_model_uri.into(),
            reject_unattributable: true,
        }
    }

    /// Accept statements without resource attribution instead of rejecting
    /// them.
    pub fn accept_unattributable(mut self) -> Self {
        self.reject_unattributable = false;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_model_uri.is_empty() {
            return Err(ConfigError::Invalid {
                message: "data_model_uri must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_defaults() {
        let config = StoreConfig::in_memory("http://example.org/dm");
        assert!(config.index_dir.is_none());
        assert!(config.reject_unattributable);
        config.validate().unwrap();
    }

    #[test]
    fn empty_data_model_uri_is_invalid() {
        let config = StoreConfig::in_memory("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn accept_unattributable_flips_policy() {
        let config = StoreConfig::in_memory("http://example.org/dm").accept_unattributable();
        assert!(!config.reject_unattributable);
    }
}
