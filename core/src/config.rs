//! Graph engine configuration
//!
//! [`GraphConfig`] holds the defaults applied to slots that do not override
//! them. It is plain data, loadable from TOML:
//!
//! ```toml
//! name = "reporting"
//! include_foreign_keys = false
//! skip_null_records = true
//! primary_key_identity = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Defaults for templates and serializers built from a [`GraphSpec`](crate::GraphSpec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Label carried by templates and emitted with trace events
    pub name: String,
    /// Keep foreign key attributes in the default record transform
    pub include_foreign_keys: bool,
    /// Skip records whose attributes are all absent or NULL
    pub skip_null_records: bool,
    /// Record slots default to primary key identity (otherwise never identical)
    pub primary_key_identity: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            name: "default".to_owned(),
            include_foreign_keys: true,
            skip_null_records: true,
            primary_key_identity: true,
        }
    }
}

impl GraphConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_foreign_keys(mut self, include: bool) -> Self {
        self.include_foreign_keys = include;
        self
    }

    #[must_use]
    pub fn with_skip_null_records(mut self, skip: bool) -> Self {
        self.skip_null_records = skip;
        self
    }

    #[must_use]
    pub fn with_primary_key_identity(mut self, enabled: bool) -> Self {
        self.primary_key_identity = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GraphConfig::default();
        assert_eq!(cfg.name, "default");
        assert!(cfg.include_foreign_keys);
        assert!(cfg.skip_null_records);
        assert!(cfg.primary_key_identity);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg = GraphConfig::from_toml_str("include_foreign_keys = false").unwrap();
        assert!(!cfg.include_foreign_keys);
        assert!(cfg.skip_null_records);
        assert_eq!(cfg.name, "default");
    }

    #[test]
    fn test_empty_toml() {
        assert_eq!(GraphConfig::from_toml_str("").unwrap(), GraphConfig::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = GraphConfig::from_toml_str("include_fks = false").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relgraph.toml");
        std::fs::write(&path, "name = \"reports\"\nskip_null_records = false\n").unwrap();

        let cfg = GraphConfig::from_path(&path).unwrap();
        assert_eq!(cfg.name, "reports");
        assert!(!cfg.skip_null_records);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = GraphConfig::from_path(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
