//! # mortar-config
//!
//! Configuration for the mortar stylesheet pipeline: the [`PipelineConfig`]
//! shape, the [`ConfigSource`] seam the pipeline loads it through, and
//! file-based [`ConfigDiscovery`] following the postcss-load-config search
//! order.

pub mod config;
pub mod discovery;
pub mod error;
pub mod packages;

pub use config::{PipelineConfig, PluginDescriptor};
pub use discovery::{ConfigDiscovery, ConfigSource, StaticConfig, discover};
pub use error::{ConfigError, Result};
pub use packages::{is_excluded_package, normalize_package_name};
