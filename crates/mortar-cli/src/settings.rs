//! Build settings layered from defaults, `MORTAR_*` environment variables and
//! command-line flags, in increasing priority.
//!
//! Pipeline configuration (plugins, exclusions) is separate: it is discovered
//! from the project root by the pipeline itself.

use crate::cli::{BuildArgs, Mode};
use crate::error::{CliError, Result};
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "MORTAR_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub out_dir: PathBuf,
    pub mode: Mode,
    pub source_map: bool,
    pub max_parallel: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("dist"),
            mode: Mode::Development,
            source_map: false,
            max_parallel: None,
        }
    }
}

/// Only the flags actually given on the command line.
#[derive(Serialize)]
struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    out_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_parallel: Option<usize>,
}

impl From<&BuildArgs> for Overrides {
    fn from(args: &BuildArgs) -> Self {
        Self {
            out_dir: args.out_dir.clone(),
            mode: args.mode,
            source_map: args.source_map.then_some(true),
            max_parallel: args.max_parallel,
        }
    }
}

impl Settings {
    /// Priority: CLI flags > environment > defaults.
    pub fn load(args: &BuildArgs) -> Result<Self> {
        Self::extract(
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Env::prefixed(ENV_PREFIX))
                .merge(Serialized::defaults(Overrides::from(args))),
        )
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| CliError::Settings(e.to_string()))
    }
}
