//! The pipeline configuration shape.
//!
//! On disk the configuration follows the postcss-load-config layout:
//!
//! ```json
//! {
//!   "plugins": { "lightningcss": { "targets": ["> 0.5%"] } },
//!   "options": { "parser": "scss", "excludedPackages": ["acme:legacy"] }
//! }
//! ```
//!
//! Option keys are also accepted at the top level; nested `options` win.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One transform to run, by registry name, with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    #[serde(default = "empty_options")]
    pub options: Value,
}

impl PluginDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: empty_options(),
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

fn empty_options() -> Value {
    Value::Object(Default::default())
}

/// Process-wide pipeline configuration, loaded at most once.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawConfig")]
pub struct PipelineConfig {
    /// Transforms in execution order.
    pub plugins: Vec<PluginDescriptor>,
    /// Parser override handed to every transform.
    pub parser: Option<String>,
    /// `namespace:name` package identifiers whose fragments skip the transforms.
    pub excluded_packages: Vec<String>,
    /// Rewrite relative `url()` references while merging.
    pub rewrite_urls: bool,
    /// Selector budget per minified output chunk.
    pub max_selectors_per_chunk: Option<usize>,
}

impl PipelineConfig {
    /// Parses a configuration from an in-memory JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// The degenerate configuration used when no source is found.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOptions {
    parser: Option<String>,
    excluded_packages: Option<Vec<String>>,
    rewrite_urls: Option<bool>,
    max_selectors_per_chunk: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    plugins: Option<RawPlugins>,
    #[serde(default)]
    options: RawOptions,
    #[serde(flatten)]
    top_level: RawOptions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlugins {
    List(Vec<RawPluginEntry>),
    Map(IndexMap<String, Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPluginEntry {
    Name(String),
    Full(PluginDescriptor),
}

impl TryFrom<RawConfig> for PipelineConfig {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let plugins = match raw.plugins {
            None => Vec::new(),
            Some(RawPlugins::List(entries)) => entries
                .into_iter()
                .map(|entry| match entry {
                    RawPluginEntry::Name(name) => PluginDescriptor::new(name),
                    RawPluginEntry::Full(descriptor) => descriptor,
                })
                .collect(),
            Some(RawPlugins::Map(entries)) => {
                let mut plugins = Vec::with_capacity(entries.len());
                for (name, options) in entries {
                    match options {
                        Value::Bool(false) => continue,
                        Value::Bool(true) | Value::Null => plugins.push(PluginDescriptor::new(name)),
                        Value::Object(_) => {
                            plugins.push(PluginDescriptor::new(name).with_options(options))
                        }
                        other => {
                            return Err(format!(
                                "plugin `{name}` must map to an options object, `true` or `false`, found {other}"
                            ));
                        }
                    }
                }
                plugins
            }
        };

        let options = raw.options;
        let top = raw.top_level;
        Ok(Self {
            plugins,
            parser: options.parser.or(top.parser),
            excluded_packages: options
                .excluded_packages
                .or(top.excluded_packages)
                .unwrap_or_default(),
            rewrite_urls: options.rewrite_urls.or(top.rewrite_urls).unwrap_or(false),
            max_selectors_per_chunk: options
                .max_selectors_per_chunk
                .or(top.max_selectors_per_chunk),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plugins_in_list_form() {
        let config = PipelineConfig::from_value(json!({
            "plugins": ["a", { "name": "b", "options": { "x": 1 } }]
        }))
        .unwrap();
        assert_eq!(
            config.plugins,
            vec![
                PluginDescriptor::new("a"),
                PluginDescriptor::new("b").with_options(json!({ "x": 1 })),
            ]
        );
    }

    #[test]
    fn plugins_in_map_form_keep_order_and_skip_disabled() {
        let config = PipelineConfig::from_value(json!({
            "plugins": { "zeta": {}, "off": false, "alpha": true, "beta": { "y": true } }
        }))
        .unwrap();
        let names: Vec<&str> = config.plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "beta"]);
        assert_eq!(config.plugins[2].options, json!({ "y": true }));
    }

    #[test]
    fn map_form_rejects_scalar_options() {
        let err = PipelineConfig::from_value(json!({ "plugins": { "a": 3 } })).unwrap_err();
        assert!(err.to_string().contains("plugin `a`"));
    }

    #[test]
    fn nested_options_take_precedence() {
        let config = PipelineConfig::from_value(json!({
            "parser": "top",
            "excludedPackages": ["x:y"],
            "options": { "parser": "scss", "maxSelectorsPerChunk": 4000 }
        }))
        .unwrap();
        assert_eq!(config.parser.as_deref(), Some("scss"));
        assert_eq!(config.excluded_packages, vec!["x:y"]);
        assert_eq!(config.max_selectors_per_chunk, Some(4000));
        assert!(!config.rewrite_urls);
    }

    #[test]
    fn empty_object_is_degenerate() {
        assert!(PipelineConfig::from_value(json!({})).unwrap().is_empty());
    }
}
