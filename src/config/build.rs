//! `[build]` section configuration.
//!
//! Contains source/output paths and the blog and project content settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in quill.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"      # Posts and project records
/// output = "public"        # Output directory
/// static_dir = "static"    # Copied verbatim into output
///
/// [build.blog]
/// template = "post"
///
/// [build.projects]
/// categories = ["featured", "mini"]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (blog posts and project records).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Static assets directory, mirrored into the output root.
    #[serde(default = "defaults::build::static_dir")]
    #[educe(Default = defaults::build::static_dir())]
    pub static_dir: PathBuf,

    /// Layout template directory.
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Page templates, mirrored into the output root.
    #[serde(default = "defaults::build::pages")]
    #[educe(Default = defaults::build::pages())]
    pub pages: PathBuf,

    /// Remove the output directory before each build.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Skip static files whose destination is not older than the source.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub incremental_assets: bool,

    /// Blog post settings.
    #[serde(default)]
    pub blog: BlogConfig,

    /// Project record settings.
    #[serde(default)]
    pub projects: ProjectsConfig,
}

/// `[build.blog]` section - markdown posts.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// Posts directory, relative to `build.content`.
    #[serde(default = "defaults::build::blog::dir")]
    #[educe(Default = defaults::build::blog::dir())]
    pub dir: PathBuf,

    /// Extension of post files; anything else is skipped.
    #[serde(default = "defaults::build::blog::extension")]
    #[educe(Default = defaults::build::blog::extension())]
    pub extension: String,

    /// Name of the template each post is rendered with.
    #[serde(default = "defaults::build::blog::template")]
    #[educe(Default = defaults::build::blog::template())]
    pub template: String,

    /// Output subdirectory for rendered posts, relative to `build.output`.
    #[serde(default = "defaults::build::blog::output")]
    #[educe(Default = defaults::build::blog::output())]
    pub output: PathBuf,
}

/// `[build.projects]` section - project records.
///
/// Each category is a subdirectory of `<content>/<dir>/` holding
/// YAML (one or more documents per file) or JSON records.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectsConfig {
    /// Projects directory, relative to `build.content`.
    #[serde(default = "defaults::build::projects::dir")]
    #[educe(Default = defaults::build::projects::dir())]
    pub dir: PathBuf,

    /// Category subdirectories, in the order they are loaded.
    #[serde(default = "defaults::build::projects::categories")]
    #[educe(Default = defaults::build::projects::categories())]
    pub categories: Vec<String>,
}
