//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::config::CONFIG_FILE;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

/// Quill static site generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Site root directory
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the root
    #[arg(short = 'C', long, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Shared build arguments for Build and Server commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scaffold a new site
    Init {
        /// the name(path) of site directory, related to `root`
        name: Option<PathBuf>,
    },

    /// Build the site once
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then serve the output and rebuild on change
    Server {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// enable watch
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,
    },
}

impl Cli {
    /// Parse arguments, or print help and return `None`.
    ///
    /// Unknown or missing arguments are not an error for this tool:
    /// help is printed and the process exits successfully.
    pub fn parse_or_help() -> Option<Self> {
        Self::parse_from_or_help(std::env::args_os())
    }

    pub fn parse_from_or_help<I, T>(args: I) -> Option<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(cli) if cli.command.is_some() => Some(cli),
            Ok(_) => {
                Self::command().print_help().ok();
                None
            }
            Err(err) => {
                use clap::error::ErrorKind;
                match err.kind() {
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                        err.print().ok();
                    }
                    _ => {
                        Self::command().print_help().ok();
                    }
                }
                None
            }
        }
    }

    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Commands::Init { .. }))
    }
}
