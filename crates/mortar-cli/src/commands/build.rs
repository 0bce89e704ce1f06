//! `mortar build`: one build pass over stylesheet files on disk.

use crate::cli::BuildArgs;
use crate::error::{CliError, Result};
use crate::host::collect_inputs;
use crate::settings::Settings;
use crate::ui;
use mortar_bundler::{BuildOptions, CssMinifier, InputFile, OutputStylesheet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Base name of production output files.
const PRODUCTION_STEM: &str = "styles";

/// Runs the pass and writes its output under the output directory.
///
/// Fragment errors are printed and the output is still written; the command
/// then fails with [`CliError::FragmentsFailed`].
pub async fn execute(args: BuildArgs) -> Result<()> {
    let start = Instant::now();
    let settings = Settings::load(&args)?;
    let root = match &args.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().map_err(|source| CliError::Read {
            path: PathBuf::from("."),
            source,
        })?,
    };

    let files = collect_inputs(&root, &args.inputs)?;
    let Some(primary) = files.first() else {
        return Err(CliError::NoInputs(args.inputs.clone()));
    };

    let mut options = BuildOptions {
        mode: settings.mode.into(),
        source_maps: settings.source_map,
        ..BuildOptions::default()
    };
    if let Some(max_parallel) = settings.max_parallel {
        options.max_parallel = max_parallel;
    }
    debug!(?options, root = %root.display(), "starting build");

    let minifier = CssMinifier::discover(&root);
    let inputs: Vec<Arc<dyn InputFile>> = files
        .iter()
        .map(|file| Arc::clone(file) as Arc<dyn InputFile>)
        .collect();
    let summary = minifier.process_files_for_bundle(&inputs, &options).await?;

    for file in &files {
        for error in file.take_errors() {
            ui::error(&format!("{}: {error}", file.path_in_bundle()));
        }
    }

    let out_dir = root.join(&settings.out_dir);
    for (path, size) in write_outputs(&out_dir, primary.take_outputs())? {
        ui::info(&format!("{} {}", path.display(), ui::format_size(size)));
    }

    if summary.errors > 0 {
        return Err(CliError::FragmentsFailed {
            count: summary.errors,
        });
    }
    ui::success(&format!(
        "Merged {} stylesheet(s) in {:.2?}",
        summary.fragments,
        start.elapsed()
    ));
    Ok(())
}

/// File names for a pass's outputs: the host path when set, otherwise
/// `styles.css`, or `styles-1.css`, `styles-2.css`, ... for chunks.
pub fn output_names(outputs: &[OutputStylesheet]) -> Vec<String> {
    outputs
        .iter()
        .enumerate()
        .map(|(index, output)| match &output.path {
            Some(path) => path.clone(),
            None if outputs.len() == 1 => format!("{PRODUCTION_STEM}.css"),
            None => format!("{PRODUCTION_STEM}-{}.css", index + 1),
        })
        .collect()
}

/// Writes stylesheets (and their maps) into `out_dir`, returning each written
/// stylesheet path with its size.
pub fn write_outputs(out_dir: &Path, outputs: Vec<OutputStylesheet>) -> Result<Vec<(PathBuf, usize)>> {
    if outputs.is_empty() {
        return Ok(Vec::new());
    }
    let write_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| CliError::Write { path, source }
    };
    std::fs::create_dir_all(out_dir).map_err(write_error(out_dir))?;

    let names = output_names(&outputs);
    let mut written = Vec::with_capacity(outputs.len());
    for (name, output) in names.into_iter().zip(outputs) {
        let path = out_dir.join(&name);
        let mut data = output.data;
        if let Some(map) = output.source_map {
            let map_name = format!("{name}.map");
            let map_path = out_dir.join(&map_name);
            std::fs::write(&map_path, map).map_err(write_error(&map_path))?;
            if !data.is_empty() && !data.ends_with('\n') {
                data.push('\n');
            }
            data.push_str(&format!("/*# sourceMappingURL={map_name} */\n"));
        }
        std::fs::write(&path, &data).map_err(write_error(&path))?;
        written.push((path, data.len()));
    }
    Ok(written)
}
