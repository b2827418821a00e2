//! Configuration for wrapgen
//!
//! A `.wrapgen.json` file in the working directory or any parent provides
//! defaults for the command line. Relative paths in it are resolved against
//! the directory holding the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::Layer;

pub const CONFIG_FILE_NAME: &str = ".wrapgen.json";
const ALT_CONFIG_FILE_NAME: &str = "wrapgen.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct WrapgenConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    pub layer: Layer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    /// Fail on the first inconsistency instead of emitting placeholders.
    pub strict: bool,
    pub debug: bool,
    /// Generate the catalog's procedures sorted by name.
    pub sort: bool,
}

impl Default for WrapgenConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            layer: Layer::C,
            output: None,
            report: None,
            strict: true,
            debug: false,
            sort: false,
        }
    }
}

impl WrapgenConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Nearest config file at or above `start_path`.
    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in [CONFIG_FILE_NAME, ALT_CONFIG_FILE_NAME] {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }
            current = current.parent()?;
        }
    }

    /// The nearest config file's settings, or the defaults if there is none.
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => Self::load_from_file(&path),
            None => {
                debug!("No configuration file found above {}", start_path.display());
                Ok(Self::default())
            }
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.catalog, &mut self.output, &mut self.report]
            .into_iter()
            .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_and_partial_files() {
        let config: WrapgenConfig = serde_json::from_str(r#"{ "layer": "F08" }"#).unwrap();
        assert_eq!(config.layer, Layer::F08);
        assert!(config.strict);
        assert!(config.catalog.is_none());
    }

    #[test]
    fn test_save_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let config = WrapgenConfig {
            catalog: Some(PathBuf::from("data/catalog.json")),
            report: Some(PathBuf::from("/tmp/report.json")),
            strict: false,
            ..Default::default()
        };
        let path = dir.path().join(CONFIG_FILE_NAME);
        config.save_to_file(&path).unwrap();

        let loaded = WrapgenConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.catalog, Some(dir.path().join("data/catalog.json")));
        assert_eq!(loaded.report, Some(PathBuf::from("/tmp/report.json")));
        assert!(!loaded.strict);
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(WrapgenConfig::find_config_file(&nested).is_none_or(|p| !p.starts_with(dir.path())));

        let path = dir.path().join(ALT_CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "debug": true }"#).unwrap();
        assert_eq!(WrapgenConfig::find_config_file(&nested), Some(path));
        assert!(WrapgenConfig::discover(&nested).unwrap().debug);
    }

    #[test]
    fn test_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "layer": "cobol" }"#).unwrap();
        let err = WrapgenConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
