//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Pack playground projects into share tokens and back
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: replbox.toml, optional)
    #[arg(short = 'C', long, global = true, default_value = "replbox.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Encode the files of a directory into a share token
    #[command(visible_alias = "p")]
    Pack {
        /// Project directory (top-level files only)
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Print a full URL by appending the token to this base
        #[arg(short, long, value_hint = clap::ValueHint::Url)]
        url: Option<String>,
    },

    /// Write the files of a share token into a directory
    #[command(visible_alias = "u")]
    Unpack {
        /// Token, with or without `#`, or a URL ending in one
        token: String,

        /// Output directory
        #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
        output: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Decode a share token and report its files and diagnostics
    #[command(visible_alias = "c")]
    Check {
        /// Token, with or without `#`, or a URL ending in one
        token: String,
    },
}
