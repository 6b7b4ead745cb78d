use crate::error::{IngestError, Result};
use context_sections::{EngineConfig, ExtractiveConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "contextrie.toml";

/// Ingestion settings, usually loaded from `contextrie.toml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Where `<id>.json` files are written
    pub output_dir: PathBuf,

    /// Files ingested at the same time
    pub max_parallel_files: usize,

    /// Section engine settings
    pub engine: EngineConfig,

    /// Extractive provider limits
    pub provider: ExtractiveConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(".contextrie"),
            max_parallel_files: 4,
            engine: EngineConfig::default(),
            provider: ExtractiveConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load config.
    ///
    /// With `Some(path)` the file must exist and parse. With `None`, `contextrie.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !explicit && !path.exists() {
            log::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)?;
        let config = Self::from_toml(&raw).map_err(|message| IngestError::ConfigError {
            path: path.clone(),
            message,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn from_toml(raw: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(raw).map_err(|err| err.to_string())?;
        config.validate().map_err(|err| err.to_string())?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_files == 0 {
            return Err(IngestError::Other(
                "max_parallel_files must be at least 1".to_string(),
            ));
        }
        self.engine.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_sections::TraversalMode;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(IngestConfig::from_toml("").unwrap(), IngestConfig::default());
    }

    #[test]
    fn full_file_is_parsed() {
        let config = IngestConfig::from_toml(
            r#"
output_dir = "out"
max_parallel_files = 2

[engine]
mode = "independent"
max_concurrency = 3

[provider]
max_keypoints = 5
"#,
        )
        .unwrap();

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.max_parallel_files, 2);
        assert_eq!(config.engine.mode, TraversalMode::Independent);
        assert_eq!(config.engine.max_concurrency, Some(3));
        assert_eq!(config.engine.max_leaf_size, None);
        assert_eq!(config.provider.max_keypoints, 5);
        assert_eq!(config.provider.max_input_chars, 4000);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(IngestConfig::from_toml("max_parallel_files = 0").is_err());
        assert!(IngestConfig::from_toml("[engine]\nmax_leaf_size = 0").is_err());
        assert!(IngestConfig::from_toml("[engine]\nmode = \"sideways\"").is_err());
    }

    #[test]
    fn explicit_path_must_exist_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            IngestConfig::load(Some(&missing)),
            Err(IngestError::IoError(_))
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::File::create(&bad)
            .unwrap()
            .write_all(b"max_parallel_files = \"many\"")
            .unwrap();
        let err = IngestConfig::load(Some(&bad)).unwrap_err();
        assert!(matches!(err, IngestError::ConfigError { ref path, .. } if path == &bad));

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "max_parallel_files = 7").unwrap();
        assert_eq!(IngestConfig::load(Some(&good)).unwrap().max_parallel_files, 7);
    }
}
