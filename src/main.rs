//! replbox - pack playground projects into share tokens and back.

mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use replbox::config::StoreConfig;
use replbox::{debug, log, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = Arc::new(load_config(&cli.config)?);

    match &cli.command {
        Commands::Pack { dir, url } => {
            let token = cli::pack::pack_dir(dir, &config)?;
            match url {
                Some(base) => println!("{}{token}", base.trim_end_matches('#')),
                None => println!("{token}"),
            }
            Ok(())
        }
        Commands::Unpack {
            token,
            output,
            force,
        } => {
            let written = cli::pack::unpack_to(token, output, *force)?;
            for path in &written {
                debug!("unpack"; "wrote {}", path.display());
            }
            log!("unpack"; "{} files written to {}", written.len(), output.display());
            Ok(())
        }
        Commands::Check { token } => cli::check::run(token, config),
    }
}

/// The config file is optional; defaults apply when it does not exist.
fn load_config(path: &Path) -> Result<StoreConfig> {
    if !path.exists() {
        debug!("config"; "{} not found, using defaults", path.display());
        return Ok(StoreConfig::default());
    }
    StoreConfig::load(path)
        .with_context(|| format!("Failed to load config '{}'", path.display()))
}
