//! # mortar-bundler
//!
//! Build-pass orchestration for the mortar stylesheet pipeline.
//!
//! A host build tool hands every stylesheet fragment of a bundle to
//! [`CssMinifier::process_files_for_bundle`] as an [`InputFile`]. The pass runs
//! the configured transforms over each fragment, merges the results, and emits
//! either readable CSS (development) or minified chunks (production), with
//! optional stitched source maps.
//!
//! ```no_run
//! use mortar_bundler::{BuildOptions, CssMinifier, InputFile};
//! use std::sync::Arc;
//!
//! # async fn run(files: Vec<Arc<dyn InputFile>>) -> mortar_bundler::Result<()> {
//! let minifier = CssMinifier::discover(".");
//! let summary = minifier
//!     .process_files_for_bundle(&files, &BuildOptions::production())
//!     .await?;
//! println!("{} fragments, {} errors", summary.fragments, summary.errors);
//! # Ok(())
//! # }
//! ```
//!
//! With the `logging` feature, [`logging`] installs a `tracing` subscriber.

pub mod error;
pub mod host;
pub mod pipeline;
pub mod transform;

#[cfg(feature = "logging")]
pub mod logging;

pub use error::{PipelineError, Result};
pub use host::{FragmentError, InputFile, OutputStylesheet};
pub use pipeline::{
    BuildMode, BuildOptions, CssMinifier, DEV_OUTPUT_PATH, PassSummary, is_import_only,
    transform_origin,
};
pub use transform::{
    LightningCssTransform, Transform, TransformContext, TransformError, TransformFactory,
    TransformOutput, TransformRegistry, TransformStage,
};

pub use mortar_config::{ConfigDiscovery, ConfigError, ConfigSource, PipelineConfig, PluginDescriptor, StaticConfig};
