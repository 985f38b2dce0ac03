//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Hierarchical tree state engine: expand, search, select and check over a TOML tree
#[derive(Parser, Debug)]
#[command(name = "treestate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the visible rows of a tree document after applying intents
    Show(ShowArgs),

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// Intents are applied in this order: expand, expand-all, reveal, check,
// select, search.
#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Tree document (TOML)
    #[arg(value_hint = ValueHint::FilePath)]
    pub document: PathBuf,

    /// Expand a node; lazy nodes are loaded from the document's `lazy` table
    #[arg(short, long = "expand", value_name = "ID")]
    pub expand: Vec<String>,

    /// Expand every loaded node
    #[arg(long)]
    pub expand_all: bool,

    /// Expand the ancestors of a node so it becomes visible
    #[arg(long = "reveal", value_name = "ID")]
    pub reveal: Vec<String>,

    /// Check a node (cascades to its subtree)
    #[arg(short, long = "check", value_name = "ID")]
    pub check: Vec<String>,

    /// Select a node
    #[arg(short, long = "select", value_name = "ID")]
    pub select: Vec<String>,

    /// Filter rows by a case-insensitive label substring
    #[arg(long, value_name = "TERM")]
    pub search: Option<String>,

    /// Plain tree rendering without state markers or colors
    #[arg(long)]
    pub plain: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective merged settings
    Show,
    /// Print a commented config template
    Template,
    /// Show the global config file location
    Path,
}
