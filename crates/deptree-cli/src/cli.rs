//! CLI argument definitions for deptree.
//!
//! Uses `clap` derive macros to define the command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "deptree",
    version,
    about = "Render Maven-style dependency trees",
    long_about = "deptree assembles dependency trees from recorded resolver callbacks or \
                  already resolved dependency graphs, and renders them as text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file to use instead of deptree.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render the tree of a recorded resolution (JSON event stream)
    Tree {
        /// Recorded resolution file
        file: PathBuf,
        #[command(flatten)]
        opts: TreeArgs,
    },

    /// Render the tree of a resolved dependency graph (JSON document)
    Graph {
        /// Resolved graph file
        file: PathBuf,
        #[command(flatten)]
        opts: TreeArgs,
    },

    /// Print the effective configuration
    Config,
}

/// Options shared by `tree` and `graph`.
#[derive(Args, Debug, Default)]
pub struct TreeArgs {
    /// Project coordinates (defaults to the root of the input)
    #[arg(long)]
    pub project: Option<String>,
    /// Coordinates of a project built alongside; may be repeated
    #[arg(long = "reactor")]
    pub reactor: Vec<String>,
    /// Tree tokens: standard, whitespace, extended
    #[arg(long)]
    pub tokens: Option<String>,
    /// Only show dependencies visible in this scope
    #[arg(long)]
    pub scope: Option<String>,
    /// Only show artifacts matching this pattern; may be repeated
    #[arg(long = "include")]
    pub includes: Vec<String>,
    /// Hide artifacts matching this pattern; may be repeated
    #[arg(long = "exclude")]
    pub excludes: Vec<String>,
    /// Use the legacy indentation-only rendering
    #[arg(long)]
    pub legacy: bool,
    /// Print version conflicts after the tree
    #[arg(long)]
    pub conflicts: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}
