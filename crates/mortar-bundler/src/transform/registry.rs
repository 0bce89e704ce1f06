//! Name-to-transform resolution for configured plugins.

use super::{LightningCssTransform, Transform, TransformStage};
use mortar_config::{ConfigError, PluginDescriptor};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Builds a transform from the options of a plugin descriptor.
pub type TransformFactory =
    Arc<dyn Fn(&Value) -> Result<Arc<dyn Transform>, ConfigError> + Send + Sync>;

/// Known transforms by plugin name.
#[derive(Clone, Default)]
pub struct TransformRegistry {
    factories: FxHashMap<String, TransformFactory>,
}

impl TransformRegistry {
    /// An empty registry; every configured plugin is unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in `lightningcss` transform.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(LightningCssTransform::NAME, |options: &Value| {
            LightningCssTransform::from_options(options)
                .map(|transform| Arc::new(transform) as Arc<dyn Transform>)
        });
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<Arc<dyn Transform>, ConfigError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Registers a ready-made transform under its own name, ignoring options.
    pub fn register_transform(&mut self, transform: Arc<dyn Transform>) -> &mut Self {
        let name = transform.name().to_string();
        self.register(name, move |_: &Value| Ok(transform.clone()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolves `plugins` in order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownPlugin`] for names without a factory, or whatever
    /// the factory reports for invalid options.
    pub fn build_stage(&self, plugins: &[PluginDescriptor]) -> Result<TransformStage, ConfigError> {
        let transforms = plugins
            .iter()
            .map(|plugin| {
                let factory =
                    self.factories
                        .get(&plugin.name)
                        .ok_or_else(|| ConfigError::UnknownPlugin {
                            name: plugin.name.clone(),
                        })?;
                factory(&plugin.options)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TransformStage::new(transforms))
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TransformRegistry")
            .field("transforms", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builtins_include_lightningcss() {
        let registry = TransformRegistry::with_builtins();
        assert!(registry.contains("lightningcss"));
        let stage = registry
            .build_stage(&[PluginDescriptor::new("lightningcss")])
            .unwrap();
        assert_eq!(stage.names(), vec!["lightningcss"]);
    }

    #[test]
    fn unknown_plugin_is_a_config_error() {
        let err = TransformRegistry::with_builtins()
            .build_stage(&[PluginDescriptor::new("autoprefixer")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPlugin { name } if name == "autoprefixer"));
    }

    #[test]
    fn invalid_options_are_reported() {
        let err = TransformRegistry::with_builtins()
            .build_stage(&[PluginDescriptor::new("lightningcss").with_options(json!({ "targets": 5 }))])
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPluginOptions { .. }));
    }
}
