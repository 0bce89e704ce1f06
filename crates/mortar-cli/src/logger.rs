//! Logging for the `mortar` binary.
//!
//! `--verbose` turns on debug output for the mortar crates, `--quiet` limits
//! output to errors, otherwise `MORTAR_LOG` or `RUST_LOG` decide, falling back
//! to info.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "mortar_css=debug,mortar_config=debug,mortar_bundler=debug,mortar_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "warn,mortar_bundler=info,mortar_cli=info";

fn filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_env("MORTAR_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Installs the global subscriber; call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .without_time()
        .compact();

    tracing_subscriber::registry()
        .with(filter(verbose, quiet))
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_take_precedence_over_environment() {
        assert_eq!(filter(true, false).to_string(), EnvFilter::new(VERBOSE_FILTER).to_string());
        assert_eq!(filter(false, true).to_string(), EnvFilter::new(QUIET_FILTER).to_string());
    }
}
