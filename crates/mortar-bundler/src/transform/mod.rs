//! The per-fragment transform stage.
//!
//! A [`Transform`] rewrites one fragment's CSS text. The pipeline builds a
//! [`TransformStage`] from the configured plugins once per process and runs
//! every non-excluded fragment through it.

mod lightning;
mod registry;

pub use lightning::LightningCssTransform;
pub use registry::{TransformFactory, TransformRegistry};

use crate::host::FragmentError;
use async_trait::async_trait;
use miette::Diagnostic;
use mortar_css::compose_json;
use std::sync::Arc;
use thiserror::Error;

/// What a transform knows about the fragment it is processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformContext {
    /// Absolute origin of the fragment (working directory + source URL).
    pub origin: String,
    /// Parser override from the configuration.
    pub parser: Option<String>,
    /// Whether the pass builds source maps.
    pub source_map: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutput {
    pub css: String,
    /// Source map JSON from `css` back to the transform's input.
    pub map: Option<String>,
    /// Non-fatal diagnostics; logged, never fail the build.
    pub warnings: Vec<String>,
}

impl TransformOutput {
    pub fn new(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            map: None,
            warnings: Vec::new(),
        }
    }

    pub fn with_map(mut self, map: Option<String>) -> Self {
        self.map = map;
        self
    }
}

#[derive(Debug, Clone, Error, Diagnostic)]
pub enum TransformError {
    /// The transform rejected the fragment's syntax.
    #[error("{message}")]
    #[diagnostic(code(mortar::transform::syntax))]
    Syntax {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
        #[help]
        excerpt: Option<String>,
    },

    #[error("{plugin}: {message}")]
    #[diagnostic(code(mortar::transform::failed))]
    Failed { plugin: String, message: String },
}

impl TransformError {
    pub fn failed(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}

impl From<TransformError> for FragmentError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::Syntax {
                message,
                line,
                column,
                excerpt,
            } => FragmentError::syntax(&message, line, column, excerpt),
            failed @ TransformError::Failed { .. } => FragmentError::new(failed.to_string()),
        }
    }
}

/// A CSS-to-CSS transform.
#[async_trait]
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;

    async fn transform(
        &self,
        css: &str,
        context: &TransformContext,
    ) -> Result<TransformOutput, TransformError>;
}

/// An ordered chain of transforms; each one consumes the previous output.
#[derive(Clone, Default)]
pub struct TransformStage {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformStage {
    pub fn new(transforms: Vec<Arc<dyn Transform>>) -> Self {
        Self { transforms }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Runs all transforms in order, accumulating warnings.
    ///
    /// When the context asks for source maps, the output map covers the
    /// whole chain. It is `None` as soon as one transform returns no map.
    pub async fn run(
        &self,
        css: &str,
        context: &TransformContext,
    ) -> Result<TransformOutput, TransformError> {
        let mut output = TransformOutput::new(css);
        let mut mapped = context.source_map;
        for transform in &self.transforms {
            let next = transform.transform(&output.css, context).await?;
            output.css = next.css;
            output.map = if mapped {
                match (next.map, output.map.take()) {
                    (Some(map), Some(previous)) => compose_json(&map, &previous),
                    (map, None) => map,
                    (None, Some(_)) => None,
                }
            } else {
                None
            };
            mapped = output.map.is_some();
            output.warnings.extend(
                next.warnings
                    .into_iter()
                    .map(|warning| format!("{}: {warning}", transform.name())),
            );
        }
        Ok(output)
    }
}

impl std::fmt::Debug for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformStage")
            .field("transforms", &self.names())
            .finish()
    }
}
