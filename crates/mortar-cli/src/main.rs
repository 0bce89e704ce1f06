//! Entry point of the `mortar` binary.

use clap::Parser;
use miette::Result;
use mortar_cli::cli::{Cli, Command};
use mortar_cli::{commands, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    match args.command {
        Command::Build(build_args) => commands::build::execute(build_args)
            .await
            .map_err(miette::Report::new),
        Command::Inspect(inspect_args) => {
            commands::inspect::execute(inspect_args).map_err(|e| miette::miette!("{e:#}"))
        }
    }
}
