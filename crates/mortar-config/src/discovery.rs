//! Configuration sources.
//!
//! [`ConfigDiscovery`] finds a configuration file in a project root the way
//! postcss-load-config does; [`StaticConfig`] serves an in-memory value.

use std::fs;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Json, Toml};
use serde_json::Value;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{ConfigError, Result};

/// Field of `package.json` that holds the configuration.
const PACKAGE_JSON_FIELD: &str = "postcss";

/// Candidate files, in search order, after `package.json`.
const CONFIG_FILES: &[(&str, FileFormat)] = &[
    (".postcssrc", FileFormat::Json),
    (".postcssrc.json", FileFormat::Json),
    (".postcssrc.toml", FileFormat::Toml),
    ("postcss.config.json", FileFormat::Json),
    ("postcss.config.toml", FileFormat::Toml),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Toml,
    PackageJson,
}

/// Something that can produce the pipeline configuration.
///
/// `Ok(None)` means no configuration exists, which is not an error.
pub trait ConfigSource: Send + Sync {
    fn load(&self) -> Result<Option<PipelineConfig>>;
}

/// File-based configuration discovery
///
/// # Example
///
/// ```no_run
/// use mortar_config::{ConfigDiscovery, ConfigSource};
///
/// let config = ConfigDiscovery::new(".").load().unwrap().unwrap_or_default();
/// println!("{} plugins", config.plugins.len());
/// ```
#[derive(Debug, Clone)]
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. package.json (`postcss` field)
    /// 2. .postcssrc, .postcssrc.json, .postcssrc.toml
    /// 3. postcss.config.json, postcss.config.toml
    ///
    /// # Errors
    ///
    /// A `package.json` that cannot be read or is not valid JSON fails the
    /// search instead of being skipped.
    pub fn find(&self) -> Result<Option<PathBuf>> {
        let pkg_path = self.root.join("package.json");
        if pkg_path.is_file() && has_package_field(&pkg_path)? {
            return Ok(Some(pkg_path));
        }

        Ok(CONFIG_FILES
            .iter()
            .map(|(name, _)| self.root.join(name))
            .find(|path| path.is_file()))
    }

    /// Load config from a specific file path
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the file is not valid JSON/TOML or
    /// does not match the configuration shape.
    pub fn load_from(&self, path: &Path) -> Result<PipelineConfig> {
        // figment treats a missing file as empty; surface it instead
        fs::metadata(path)?;
        let figment = match format_of(path) {
            FileFormat::PackageJson => Figment::from(Json::file(path)).focus(PACKAGE_JSON_FIELD),
            FileFormat::Json => Figment::from(Json::file(path)),
            FileFormat::Toml => Figment::from(Toml::file(path)),
        };
        figment.extract().map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl ConfigSource for ConfigDiscovery {
    fn load(&self) -> Result<Option<PipelineConfig>> {
        let Some(path) = self.find()? else {
            debug!(root = %self.root.display(), "no pipeline configuration found");
            return Ok(None);
        };
        debug!(path = %path.display(), "loading pipeline configuration");
        self.load_from(&path).map(Some)
    }
}

/// An in-memory configuration source.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig(Option<PipelineConfig>);

impl StaticConfig {
    pub fn new(config: PipelineConfig) -> Self {
        Self(Some(config))
    }

    /// A source that reports "no configuration found".
    pub fn none() -> Self {
        Self(None)
    }
}

impl ConfigSource for StaticConfig {
    fn load(&self) -> Result<Option<PipelineConfig>> {
        Ok(self.0.clone())
    }
}

/// Discover config from the current directory.
pub fn discover() -> Result<Option<PipelineConfig>> {
    let root = std::env::current_dir()?;
    ConfigDiscovery::new(root).load()
}

fn format_of(path: &Path) -> FileFormat {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if name == "package.json" {
        FileFormat::PackageJson
    } else {
        CONFIG_FILES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, format)| *format)
            .unwrap_or_else(|| {
                if name.ends_with(".toml") {
                    FileFormat::Toml
                } else {
                    FileFormat::Json
                }
            })
    }
}

fn has_package_field(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path)?;
    let parsed: Value = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(parsed
        .get(PACKAGE_JSON_FIELD)
        .is_some_and(|field| !field.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn find_returns_none_when_no_config() {
        let dir = TempDir::new().unwrap();
        assert!(ConfigDiscovery::new(dir.path()).find().unwrap().is_none());
        assert!(ConfigDiscovery::new(dir.path()).load().unwrap().is_none());
    }

    #[test]
    fn package_json_without_field_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "app" }"#).unwrap();
        fs::write(dir.path().join(".postcssrc"), r#"{ "plugins": ["a"] }"#).unwrap();
        let found = ConfigDiscovery::new(dir.path()).find().unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), ".postcssrc");
    }

    #[test]
    fn format_detection() {
        assert_eq!(format_of(Path::new("a/package.json")), FileFormat::PackageJson);
        assert_eq!(format_of(Path::new(".postcssrc")), FileFormat::Json);
        assert_eq!(format_of(Path::new("custom.toml")), FileFormat::Toml);
    }

    #[test]
    fn static_config_sources() {
        assert!(StaticConfig::none().load().unwrap().is_none());
        let config = PipelineConfig {
            parser: Some("scss".into()),
            ..Default::default()
        };
        assert_eq!(StaticConfig::new(config.clone()).load().unwrap(), Some(config));
    }
}
