//! Inspector configuration
//!
//! Layered with figment: built-in defaults, then `jbridge.toml` (or an
//! explicit file), then `JBRIDGE_*` environment variables.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "jbridge.toml";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub log_filter: String,
    /// Fixture loaded into the heap runtime at startup
    pub fixture: Option<PathBuf>,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            log_filter: "jbridge=info".to_string(),
            fixture: None,
            pretty: false,
        }
    }
}

impl BridgeConfig {
    /// Load configuration. An explicit `path` must exist; the default file
    /// is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };
        Self::figment(&file).extract().map_err(|e| ConfigError::Invalid(Box::new(e)))
    }

    fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(BridgeConfig::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("JBRIDGE_"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::figment(&dir.path().join("absent.toml"))
            .extract::<BridgeConfig>()
            .unwrap();
        assert_eq!(config.log_filter, "jbridge=info");
        assert!(config.fixture.is_none());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pretty = true\nfixture = \"world.toml\"").unwrap();

        let config = BridgeConfig::load(Some(file.path())).unwrap();
        assert!(config.pretty);
        assert_eq!(config.fixture, Some(PathBuf::from("world.toml")));
        assert_eq!(config.log_filter, "jbridge=info");
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pretty = \"very\"").unwrap();
        assert!(matches!(
            BridgeConfig::load(Some(file.path())),
            Err(ConfigError::Invalid(_))
        ));
    }
}
