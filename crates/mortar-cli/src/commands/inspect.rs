//! `mortar inspect`: show how a single stylesheet parses or minifies.

use crate::cli::InspectArgs;
use anyhow::{Context, Result};
use std::fs;

pub fn execute(args: InspectArgs) -> Result<()> {
    println!("{}", render(&args)?);
    Ok(())
}

fn render(args: &InspectArgs) -> Result<String> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    if args.minified {
        let chunks = mortar_css::minify(&text)
            .context("Minification failed")?
            .into_chunks();
        return Ok(chunks.join("\n"));
    }

    let sheet = mortar_css::parse(&text, args.file.display().to_string(), args.positions)?;
    serde_json::to_string_pretty(&sheet).context("Failed to serialize syntax tree")
}
