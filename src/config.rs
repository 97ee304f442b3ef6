use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::{LogConfig, LogFormat};
use crate::protocol::{Codec, Serialization};

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "wampwire.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wire format used when a command does not name one
    pub serialization: Serialization,
    /// Logging settings
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub filter: String,
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        let defaults = LogConfig::default();
        Self {
            filter: defaults.filter,
            format: defaults.format,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Codec for the configured wire format.
    pub fn codec(&self) -> Box<dyn Codec> {
        self.serialization.codec()
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            filter: self.log.filter.clone(),
            format: self.log.format,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.serialization, Serialization::Json);
        assert_eq!(config.log.filter, "wampwire=info,warn");
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wampwire.toml");
        std::fs::write(&path, "serialization = \"msgpack\"\n").unwrap();

        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.serialization, Serialization::MsgPack);
        assert_eq!(config.log, LogSection::default());
        assert_eq!(config.codec().serialization(), Serialization::MsgPack);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wampwire.toml");
        let config = Config {
            serialization: Serialization::MsgPack,
            log: LogSection {
                filter: "wampwire=trace".into(),
                format: LogFormat::Json,
            },
        };
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(loaded, config);

        let log = loaded.log_config();
        assert_eq!(log.filter, "wampwire=trace");
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn test_bad_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wampwire.toml");
        std::fs::write(&path, "serialization = \"cbor\"\n").unwrap();

        let err = Config::load(Some(path)).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
