//! Built-in transform backed by lightningcss.
//!
//! Parses the fragment with lightningcss, lowers and prefixes it for the
//! configured browserslist targets, and prints it back unminified so the
//! pipeline's own parser and minifier see readable CSS. When the pass builds
//! source maps, the printed text comes with a map back to the input.

use super::{Transform, TransformContext, TransformError, TransformOutput};
use async_trait::async_trait;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use mortar_config::ConfigError;
use mortar_css::SyntaxError;
use parcel_sourcemap::SourceMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct LightningCssOptions {
    /// Browserslist queries, e.g. `["> 0.5%", "last 2 versions"]`.
    #[serde(default)]
    targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct LightningCssTransform {
    browsers: Option<Browsers>,
    /// Set once the unsupported parser override has been reported.
    parser_warned: Arc<AtomicBool>,
}

impl LightningCssTransform {
    pub const NAME: &'static str = "lightningcss";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the transform from plugin options, resolving browserslist
    /// queries up front so a bad query fails configuration, not a fragment.
    pub fn from_options(options: &Value) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidPluginOptions {
            plugin: Self::NAME.to_string(),
            message,
        };
        let options: LightningCssOptions = if options.is_null() {
            LightningCssOptions::default()
        } else {
            serde_json::from_value(options.clone()).map_err(|e| invalid(e.to_string()))?
        };
        let browsers = match options.targets {
            Some(queries) if !queries.is_empty() => {
                Browsers::from_browserslist(queries).map_err(|e| invalid(e.to_string()))?
            }
            _ => None,
        };
        Ok(Self {
            browsers,
            ..Self::default()
        })
    }

    fn targets(&self) -> Targets {
        Targets {
            browsers: self.browsers,
            ..Default::default()
        }
    }

    fn process(&self, css: &str, origin: &str, source_map: bool) -> Result<TransformOutput, TransformError> {
        let failed = |message: String| TransformError::failed(Self::NAME, message);

        let mut stylesheet = StyleSheet::parse(
            css,
            ParserOptions {
                filename: origin.to_string(),
                ..Default::default()
            },
        )
        .map_err(|e| {
            let message = e.kind.to_string();
            let line = e.loc.as_ref().map(|loc| loc.line + 1);
            let column = e.loc.as_ref().map(|loc| loc.column);
            let excerpt = line.map(|line| {
                SyntaxError::new(message.clone(), origin, css, line, column.unwrap_or(1))
                    .show_source_code()
            });
            TransformError::Syntax {
                message,
                line,
                column,
                excerpt,
            }
        })?;

        stylesheet
            .minify(MinifyOptions {
                targets: self.targets(),
                ..Default::default()
            })
            .map_err(|e| failed(e.to_string()))?;

        let mut map = if source_map {
            let mut map = SourceMap::new("/");
            map.add_source(origin);
            map.set_source_content(0, css).map_err(|e| failed(e.to_string()))?;
            Some(map)
        } else {
            None
        };
        let printed = stylesheet
            .to_css(PrinterOptions {
                targets: self.targets(),
                source_map: map.as_mut(),
                ..Default::default()
            })
            .map_err(|e| failed(e.to_string()))?;
        let map = map
            .map(|mut map| map.to_json(None))
            .transpose()
            .map_err(|e| failed(e.to_string()))?;
        Ok(TransformOutput::new(printed.code).with_map(map))
    }
}

#[async_trait]
impl Transform for LightningCssTransform {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn transform(
        &self,
        css: &str,
        context: &TransformContext,
    ) -> Result<TransformOutput, TransformError> {
        if let Some(parser) = context.parser.as_deref() {
            if !self.parser_warned.swap(true, Ordering::Relaxed) {
                warn!(parser, "lightningcss parses standard CSS and ignores the configured parser");
            }
        }
        self.process(css, &context.origin, context.source_map)
    }
}
