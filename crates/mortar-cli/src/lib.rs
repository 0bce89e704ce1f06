//! # mortar-cli
//!
//! The `mortar` binary: reads stylesheet files from disk, runs them through
//! the [`mortar_bundler`] pipeline, and writes the result.
//!
//! - [`cli`] - argument definitions
//! - [`settings`] - build settings from flags and `MORTAR_*` variables
//! - [`host`] - stylesheet files as pipeline inputs
//! - [`commands`] - `build` and `inspect`
//! - [`logger`] and [`ui`] - logging and status output

pub mod cli;
pub mod commands;
pub mod error;
pub mod host;
pub mod logger;
pub mod settings;
pub mod ui;

pub use error::{CliError, Result};
