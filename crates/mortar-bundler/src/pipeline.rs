//! Per-pass orchestration.
//!
//! [`CssMinifier`] is the object a host registers once per process. Every
//! build pass goes through [`CssMinifier::process_files_for_bundle`]:
//!
//! ```text
//! configure (once) -> filter import-only -> per fragment: transform + parse
//!   -> merge -> development: pretty text | production: minified chunks
//! ```
//!
//! A failing fragment is reported on its own [`InputFile`] and replaced by an
//! empty sheet; only configuration and minifier failures abort a pass.

use crate::error::{PipelineError, Result};
use crate::host::{FragmentError, InputFile, OutputStylesheet};
use crate::transform::{TransformContext, TransformRegistry, TransformStage};
use futures::stream::{self, StreamExt};
use mortar_config::{ConfigDiscovery, ConfigError, ConfigSource, PipelineConfig, is_excluded_package};
use mortar_css::{
    MergeOptions, Minifier, MinifyOptions, SourceMapStitcher, StringifyOptions, Stylesheet, compose_json,
    merge_with, parse, retarget_json, stringify,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Output path of the development artifact.
pub const DEV_OUTPUT_PATH: &str = "merged-stylesheets.css";

static IMPORT_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.import\.css$|(?:^|/)imports/").expect("valid import-only pattern")
});

/// Whether a fragment only exists to be `@import`ed by others and must not be
/// merged on its own.
pub fn is_import_only(url: &str) -> bool {
    IMPORT_ONLY.is_match(url)
}

/// Absolute origin handed to transforms: the working directory followed by
/// the fragment URL, minus the Cordova prefix.
pub fn transform_origin(cwd: &Path, url: Option<&str>) -> String {
    let url = url.map(|url| url.replacen("/__cordova", "", 1)).unwrap_or_default();
    format!("{}{url}", cwd.display())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// Readable merged output under [`DEV_OUTPUT_PATH`].
    #[default]
    Development,
    /// Minified output, possibly split into chunks.
    Production,
}

impl std::str::FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(format!("Invalid build mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    pub mode: BuildMode,
    /// Attach a stitched source map to every output stylesheet.
    pub source_maps: bool,
    /// Fragments transformed concurrently.
    pub max_parallel: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            mode: BuildMode::default(),
            source_maps: false,
            max_parallel: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl BuildOptions {
    pub fn development() -> Self {
        Self::default()
    }

    pub fn production() -> Self {
        Self {
            mode: BuildMode::Production,
            ..Self::default()
        }
    }

    pub fn with_source_maps(mut self, enabled: bool) -> Self {
        self.source_maps = enabled;
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }
}

/// Counters for one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Fragments that went through transform and parse.
    pub fragments: usize,
    /// Fragments reported as failed.
    pub errors: usize,
    /// Transform and merge warnings.
    pub warnings: usize,
    /// Stylesheets handed to the host.
    pub outputs: usize,
}

/// Configuration plus the transform stage built from it.
#[derive(Debug)]
struct Loaded {
    config: PipelineConfig,
    stage: TransformStage,
}

/// A fragment after transform and parse, successful or not.
struct Processed {
    path: Arc<str>,
    sheet: Stylesheet,
    /// The text `sheet` was parsed from.
    text: String,
    /// Map from `text` back to the fragment's original sources.
    upstream_map: Option<String>,
    failed: bool,
    warnings: usize,
}

impl Processed {
    fn failed(file: &dyn InputFile, path: Arc<str>, error: FragmentError, warnings: usize) -> Self {
        warn!(path = %path, error = %error, "fragment failed");
        file.error(error);
        Self {
            sheet: Stylesheet::empty(path.clone()),
            path,
            text: String::new(),
            upstream_map: None,
            failed: true,
            warnings,
        }
    }
}

/// The stylesheet minifier a host registers once per process.
pub struct CssMinifier {
    source: Arc<dyn ConfigSource>,
    registry: TransformRegistry,
    cwd: PathBuf,
    /// Outcome of the one configuration load, errors included.
    loaded: OnceCell<std::result::Result<Arc<Loaded>, Arc<ConfigError>>>,
}

impl CssMinifier {
    /// A minifier loading its configuration from `source`, with the built-in
    /// transforms available.
    pub fn new(source: impl ConfigSource + 'static) -> Self {
        Self::with_registry(source, TransformRegistry::with_builtins())
    }

    pub fn with_registry(source: impl ConfigSource + 'static, registry: TransformRegistry) -> Self {
        Self {
            source: Arc::new(source),
            registry,
            cwd: std::env::current_dir().unwrap_or_default(),
            loaded: OnceCell::new(),
        }
    }

    /// A minifier discovering its configuration under `root`, which also
    /// becomes the transform origin base.
    pub fn discover(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self::new(ConfigDiscovery::new(root)).with_cwd(root)
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// The loaded configuration, once a pass has loaded it successfully.
    pub fn config(&self) -> Option<&PipelineConfig> {
        self.loaded
            .get()
            .and_then(|outcome| outcome.as_ref().ok())
            .map(|loaded| &loaded.config)
    }

    async fn configure(&self) -> Result<Arc<Loaded>> {
        self.loaded
            .get_or_init(|| async { self.load() })
            .await
            .clone()
            .map_err(PipelineError::Config)
    }

    fn load(&self) -> std::result::Result<Arc<Loaded>, Arc<ConfigError>> {
        let config = match self.source.load().map_err(Arc::new)? {
            Some(config) => config,
            None => {
                debug!("no pipeline configuration found, running without transforms");
                PipelineConfig::default()
            }
        };
        let stage = self.registry.build_stage(&config.plugins).map_err(Arc::new)?;
        info!(
            transforms = ?stage.names(),
            excluded = config.excluded_packages.len(),
            "pipeline configured"
        );
        Ok(Arc::new(Loaded { config, stage }))
    }

    /// Runs one build pass over `files`, emitting output on `files[0]`.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Config`] when the configuration cannot be loaded (on
    /// this or any earlier pass), [`PipelineError::Minify`] when the merged
    /// stylesheet cannot be minified. Fragment failures are reported on the
    /// fragment and never fail the pass.
    pub async fn process_files_for_bundle(
        &self,
        files: &[Arc<dyn InputFile>],
        options: &BuildOptions,
    ) -> Result<PassSummary> {
        let loaded = self.configure().await?;

        let Some(primary) = files.first() else {
            return Ok(PassSummary::default());
        };

        let fragments: Vec<&Arc<dyn InputFile>> = files
            .iter()
            .filter(|file| {
                let url = file.source_url().unwrap_or_else(|| file.path_in_bundle());
                let skip = is_import_only(url);
                if skip {
                    debug!(url, "skipping import-only fragment");
                }
                !skip
            })
            .collect();
        if fragments.is_empty() {
            debug!(files = files.len(), "only import-only fragments, nothing to merge");
            return Ok(PassSummary::default());
        }

        let pending: Vec<_> = fragments
            .into_iter()
            .map(|file| self.process_fragment(&loaded, &**file, options.source_maps))
            .collect();
        let processed: Vec<Processed> = stream::iter(pending)
            .buffered(options.max_parallel.max(1))
            .collect()
            .await;

        let mut summary = PassSummary {
            fragments: processed.len(),
            ..PassSummary::default()
        };
        let mut stitcher = options.source_maps.then(SourceMapStitcher::new);
        let mut sheets = Vec::with_capacity(processed.len());
        for fragment in processed {
            summary.errors += usize::from(fragment.failed);
            summary.warnings += fragment.warnings;
            if let Some(stitcher) = stitcher.as_mut() {
                stitcher.register(fragment.path, &fragment.text, fragment.upstream_map.as_deref());
            }
            sheets.push(fragment.sheet);
        }

        let merge_options = MergeOptions {
            rewrite_urls: loaded.config.rewrite_urls,
        };
        let merged = merge_with(sheets, &merge_options, |path, message| {
            summary.warnings += 1;
            warn!(path, "{message}");
        });

        let outputs = match options.mode {
            BuildMode::Development => {
                let out = stringify(
                    &merged,
                    &StringifyOptions::new().with_source_map(options.source_maps),
                );
                let source_map = stitcher
                    .as_ref()
                    .zip(out.map.as_ref())
                    .map(|(stitcher, map)| stitcher.stitch_to_json(map));
                vec![OutputStylesheet {
                    data: out.text,
                    path: Some(DEV_OUTPUT_PATH.to_string()),
                    source_map,
                }]
            }
            BuildMode::Production => {
                let minifier = Minifier::new(MinifyOptions {
                    max_selectors_per_chunk: loaded.config.max_selectors_per_chunk,
                });
                match stitcher.as_ref() {
                    Some(stitcher) => minifier
                        .minify_tree(merged, true)
                        .into_iter()
                        .map(|chunk| OutputStylesheet {
                            source_map: chunk.map.as_ref().map(|map| stitcher.stitch_to_json(map)),
                            data: chunk.text,
                            path: None,
                        })
                        .collect(),
                    None => {
                        let text = stringify(&merged, &StringifyOptions::new()).text;
                        minifier
                            .minify(&text)?
                            .into_chunks()
                            .into_iter()
                            .map(|data| OutputStylesheet {
                                data,
                                ..OutputStylesheet::default()
                            })
                            .collect()
                    }
                }
            }
        };

        summary.outputs = outputs.len();
        for output in outputs {
            primary.add_stylesheet(output);
        }

        info!(
            mode = ?options.mode,
            fragments = summary.fragments,
            errors = summary.errors,
            warnings = summary.warnings,
            outputs = summary.outputs,
            "stylesheet pass complete"
        );
        Ok(summary)
    }

    async fn process_fragment(&self, loaded: &Loaded, file: &dyn InputFile, source_maps: bool) -> Processed {
        let path: Arc<str> = Arc::from(file.path_in_bundle());

        let contents = match file.contents() {
            Ok(contents) => contents,
            Err(e) => {
                let error = FragmentError::new(format!("failed to read {path}: {e}"));
                return Processed::failed(file, path, error, 0);
            }
        };

        let excluded = is_excluded_package(loaded.config.excluded_packages.as_slice(), &path);
        let (text, upstream_map, warnings) = if excluded || loaded.stage.is_empty() {
            if excluded {
                debug!(path = %path, "excluded package, skipping transforms");
            }
            (contents, file.source_map(), Vec::new())
        } else {
            let context = TransformContext {
                origin: transform_origin(&self.cwd, file.source_url()),
                parser: loaded.config.parser.clone(),
                source_map: source_maps,
            };
            match loaded.stage.run(&contents, &context).await {
                Ok(output) => {
                    // Without a transform map the text maps onto itself.
                    let map = output.map.as_deref().and_then(|map| match file.source_map() {
                        Some(upstream) => compose_json(map, &upstream),
                        None => retarget_json(map, &path, &contents),
                    });
                    (output.css, map, output.warnings)
                }
                Err(e) => return Processed::failed(file, path, e.into(), 0),
            }
        };
        for warning in &warnings {
            warn!(path = %path, "{warning}");
        }

        match parse(&text, path.clone(), true) {
            Ok(sheet) => {
                debug!(path = %path, nodes = sheet.children.len(), "parsed fragment");
                Processed {
                    path,
                    sheet,
                    text,
                    upstream_map,
                    failed: false,
                    warnings: warnings.len(),
                }
            }
            Err(e) => Processed::failed(file, path, FragmentError::from(&e), warnings.len()),
        }
    }
}

impl std::fmt::Debug for CssMinifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CssMinifier")
            .field("registry", &self.registry)
            .field("cwd", &self.cwd)
            .field("configured", &self.loaded.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_only_urls() {
        assert!(is_import_only("client/theme.import.css"));
        assert!(is_import_only("imports/ui/button.css"));
        assert!(is_import_only("/app/imports/ui/button.css"));
        assert!(!is_import_only("client/main.css"));
        assert!(!is_import_only("client/myimports/button.css"));
        assert!(!is_import_only("client/theme.import.css.map"));
    }

    #[test]
    fn origin_strips_cordova_prefix() {
        let cwd = Path::new("/work/app");
        assert_eq!(
            transform_origin(cwd, Some("/__cordova/client/main.css")),
            "/work/app/client/main.css"
        );
        assert_eq!(transform_origin(cwd, Some("/client/main.css")), "/work/app/client/main.css");
        assert_eq!(transform_origin(cwd, None), "/work/app");
    }

    #[test]
    fn build_mode_from_str() {
        assert_eq!("production".parse::<BuildMode>().unwrap(), BuildMode::Production);
        assert_eq!("DEV".parse::<BuildMode>().unwrap(), BuildMode::Development);
        assert!("release".parse::<BuildMode>().is_err());
    }

    #[test]
    fn build_options_builders() {
        let options = BuildOptions::production().with_source_maps(true).with_max_parallel(2);
        assert_eq!(options.mode, BuildMode::Production);
        assert!(options.source_maps);
        assert_eq!(options.max_parallel, 2);
        assert!(BuildOptions::default().max_parallel >= 1);
    }
}
