//! Site configuration management for `quill.toml`.
//!
//! The configuration is loaded once per invocation and then passed by
//! reference (or `Arc`) into the builder, watcher and server.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[base]`    | Site metadata (site name, author, url)       |
//! | `[build]`   | Source/output paths, blog and projects       |
//! | `[serve]`   | Development server (port, interface, watch)  |
//!
//! # Example
//!
//! ```toml
//! [base]
//! site_name = "rytc.io"
//!
//! [build]
//! output = "public"
//!
//! [build.projects]
//! categories = ["featured", "mini", "retired"]
//!
//! [serve]
//! port = 5277
//! ```

mod base;
mod build;
pub mod defaults;
mod error;
mod serve;

pub use base::BaseConfig;
pub use build::{BlogConfig, BuildConfig, ProjectsConfig};
pub use error::ConfigError;
pub use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default config filename
pub const CONFIG_FILE: &str = "quill.toml";

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quill.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Directory holding markdown posts.
    pub fn blog_dir(&self) -> PathBuf {
        self.build.content.join(&self.build.blog.dir)
    }

    /// Directory rendered posts are written to.
    pub fn blog_output_dir(&self) -> PathBuf {
        self.build.output.join(&self.build.blog.output)
    }

    /// Directory holding one subdirectory per project category.
    pub fn projects_dir(&self) -> PathBuf {
        self.build.content.join(&self.build.projects.dir)
    }

    /// Directory holding the records of one project category.
    pub fn project_dir(&self, category: &str) -> PathBuf {
        self.projects_dir().join(category)
    }

    /// Update configuration with CLI arguments and resolve all paths.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = match &cli.command {
            Some(Commands::Init { name: Some(name) }) => cli
                .root
                .clone()
                .unwrap_or_else(|| self.get_root().to_owned())
                .join(name),
            _ => cli
                .root
                .clone()
                .unwrap_or_else(|| self.get_root().to_owned()),
        };

        match &cli.command {
            Some(Commands::Build { build_args }) => {
                self.build.clean |= build_args.clean;
            }
            Some(Commands::Server {
                build_args,
                interface,
                port,
                watch,
            }) => {
                self.build.clean |= build_args.clean;
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            _ => {}
        }

        self.resolve_paths(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve every directory against `root` and normalize to absolute paths.
    pub fn resolve_paths(&mut self, root: &Path, config_file: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_file));
        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.static_dir = Self::normalize_path(&root.join(&self.build.static_dir));
        self.build.templates = Self::normalize_path(&root.join(&self.build.templates));
        self.build.pages = Self::normalize_path(&root.join(&self.build.pages));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before a build or serve run.
    ///
    /// Only checks what can be known up front; missing content
    /// directories are reported by the build stage that needs them.
    pub fn validate(&self) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found: {}", self.config_path.display());
        }

        if self.base.site_name.trim().is_empty() {
            bail!(ConfigError::Validation("[base.site_name] must not be empty".into()));
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.blog.extension.is_empty() || self.build.blog.extension.starts_with('.') {
            bail!(ConfigError::Validation(
                "[build.blog.extension] must be a bare extension such as \"md\"".into()
            ));
        }

        for (field, path) in [
            ("templates", &self.build.templates),
            ("pages", &self.build.pages),
        ] {
            if !path.is_dir() {
                bail!(ConfigError::MissingDir {
                    field,
                    path: path.clone(),
                });
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
