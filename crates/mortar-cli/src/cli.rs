//! Command-line interface definition.
//!
//! - `mortar build` - run a build pass over stylesheet files and write the output
//! - `mortar inspect` - print the parsed syntax tree of one stylesheet

use clap::{Args, Parser, Subcommand, ValueEnum};
use mortar_bundler::BuildMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Mortar - merge, minify and source-map CSS fragments
#[derive(Parser, Debug)]
#[command(
    name = "mortar",
    version,
    about = "Merge, minify and source-map CSS fragments",
    long_about = "Mortar runs configured CSS transforms over every stylesheet fragment,\n\
                  merges them into one stylesheet with @import hoisting, and writes either\n\
                  readable (development) or minified (production) output."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge stylesheet fragments into one output
    Build(BuildArgs),

    /// Print the syntax tree of a stylesheet as JSON
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Stylesheet files or directories, merged in the order given
    ///
    /// Directories are searched recursively for `.css` files in file name order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory [env: MORTAR_OUT_DIR] [default: dist]
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Build mode [env: MORTAR_MODE] [default: development]
    #[arg(short, long, value_enum)]
    pub mode: Option<Mode>,

    /// Write a source map next to every output file
    #[arg(long)]
    pub source_map: bool,

    /// Project root: configuration lookup and bundle paths are relative to it
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Fragments transformed concurrently [env: MORTAR_MAX_PARALLEL]
    #[arg(long)]
    pub max_parallel: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Stylesheet to parse
    pub file: PathBuf,

    /// Include line and column of every node
    #[arg(long)]
    pub positions: bool,

    /// Print the minified stylesheet instead of the tree
    #[arg(long)]
    pub minified: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl From<Mode> for BuildMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => BuildMode::Development,
            Mode::Production => BuildMode::Production,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build_flags() {
        let cli = Cli::parse_from([
            "mortar",
            "build",
            "client",
            "extra.css",
            "--mode",
            "production",
            "--source-map",
            "-o",
            "out",
        ]);
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };
        assert_eq!(args.inputs, vec![PathBuf::from("client"), PathBuf::from("extra.css")]);
        assert_eq!(args.mode, Some(Mode::Production));
        assert!(args.source_map);
        assert_eq!(args.out_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["mortar", "-v", "-q", "inspect", "a.css"]).is_err());
    }
}
