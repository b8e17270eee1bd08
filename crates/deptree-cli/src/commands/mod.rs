//! Command dispatch and handler modules.

mod config;
mod tree;

use std::path::Path;

use deptree_core::config::{BackendKind, TreeConfig};
use deptree_util::errors::DepTreeError;
use miette::Result;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Tree { file, opts } => tree::exec(&file, None, &opts, config),
        Command::Graph { file, opts } => tree::exec(&file, Some(BackendKind::Graph), &opts, config),
        Command::Config => config::exec(&config),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<TreeConfig> {
    let cwd = std::env::current_dir().map_err(DepTreeError::Io)?;
    Ok(TreeConfig::load(explicit, &cwd)?)
}
