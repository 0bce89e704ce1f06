//! Errors of the `mortar` binary.

use miette::Diagnostic;
use mortar_bundler::PipelineError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid settings: {0}")]
    #[diagnostic(
        code(mortar::cli::settings),
        help("Check the MORTAR_* environment variables and command-line flags")
    )]
    Settings(String),

    #[error("No stylesheets found in {}", .0.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", "))]
    #[diagnostic(
        code(mortar::cli::no_inputs),
        help("Pass .css files or directories containing them")
    )]
    NoInputs(Vec<PathBuf>),

    #[error("Failed to read {}", .path.display())]
    #[diagnostic(code(mortar::cli::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}", .path.display())]
    #[diagnostic(code(mortar::cli::write), help("Check output directory permissions"))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{count} stylesheet(s) failed to build")]
    #[diagnostic(code(mortar::cli::fragments))]
    FragmentsFailed { count: usize },
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;
