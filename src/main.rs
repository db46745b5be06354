//! Quill - a static site generator for a personal site: pages, a blog and projects.

mod assets;
mod build;
mod cli;
mod compose;
mod config;
mod content;
mod init;
mod logger;
mod serve;
mod template;
mod watch;

use anyhow::{Result, bail};
use build::build_site;
use cli::{Cli, Commands};
use config::SiteConfig;
use init::new_site;
use serve::serve_site;
use std::{path::Path, sync::Arc};

fn main() -> Result<()> {
    let Some(cli) = Cli::parse_or_help() else {
        return Ok(());
    };
    let config = load_config(&cli)?;

    match &cli.command {
        Some(Commands::Init { name }) => new_site(&config, name.is_some()),
        Some(Commands::Build { .. }) => build_site(&config).map(|_| ()).map_err(Into::into),
        Some(Commands::Server { .. }) => {
            if let Err(err) = build_site(&config) {
                // a broken site can still be fixed while the server watches
                if !config.serve.watch {
                    return Err(err.into());
                }
                log!("error"; "{:#}", anyhow::Error::new(err));
            }
            serve_site(Arc::new(config))
        }
        None => Ok(()),
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);

    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found: {}", config.config_path.display()),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}
