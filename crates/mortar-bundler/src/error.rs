//! Pass-level errors.
//!
//! Fragment failures never show up here; they are reported to the host
//! through [`crate::InputFile::error`] and the pass continues.

use miette::Diagnostic;
use mortar_config::ConfigError;
use mortar_css::MinifyError;
use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum PipelineError {
    /// Loading the pipeline configuration failed. The outcome is cached, so
    /// every later pass in the process reports the same error.
    #[error("failed to load pipeline configuration: {0}")]
    #[diagnostic(
        code(mortar::config),
        help("Check the `postcss` field of package.json or your .postcssrc / postcss.config.* file")
    )]
    Config(Arc<ConfigError>),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Minify(#[from] MinifyError),
}
