//! Site building orchestration.
//!
//! One pass runs strictly in order; the first failing stage aborts the pass.
//!
//! ```text
//! Idle
//!  └─► CopyingAssets      static/ ──► public/
//!       └─► LoadingTemplates   templates/ + pages/ ──► TemplateRegistry
//!            └─► LoadingContent     posts + projects, newest first
//!                 └─► ComposingPages     pages/**.html ──► public/**.html
//!                      └─► ComposingPosts     blog/*.md ──► public/blog/*.html
//!                           └─► Done
//!
//! any stage ──error──► Failed
//! ```
//!
//! Everything is rebuilt from scratch on every pass; nothing is cached
//! between passes except unchanged static files.

use crate::{
    assets::copy_static,
    compose::{PageComposer, Sections, SiteModel},
    config::SiteConfig,
    content::{Post, load_posts, load_projects, newest_first},
    log,
    logger::ProgressBars,
    template::TemplateRegistry,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Where a build pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    Idle,
    CopyingAssets,
    LoadingTemplates,
    LoadingContent,
    ComposingPages,
    ComposingPosts,
    Done,
    Failed,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::CopyingAssets => "copying assets",
            Self::LoadingTemplates => "loading templates",
            Self::LoadingContent => "loading content",
            Self::ComposingPages => "composing pages",
            Self::ComposingPosts => "composing posts",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// A failed build pass, tagged with the stage that failed.
#[derive(Debug, Error)]
#[error("build failed while {stage}")]
pub struct BuildError {
    pub stage: BuildStage,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

/// What a successful pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub assets_copied: usize,
    pub pages: usize,
    pub posts: usize,
    pub drafts: usize,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} posts ({} drafts skipped), {} assets copied",
            self.pages, self.posts, self.drafts, self.assets_copied
        )
    }
}

/// Runs one build pass over a site.
pub struct SiteBuilder<'a> {
    config: &'a SiteConfig,
    stage: BuildStage,
}

impl<'a> SiteBuilder<'a> {
    pub const fn new(config: &'a SiteConfig) -> Self {
        Self {
            config,
            stage: BuildStage::Idle,
        }
    }

    /// Run every stage in order. Ends in `Done` or `Failed`.
    pub fn run(&mut self) -> Result<BuildReport, BuildError> {
        match self.run_stages() {
            Ok(report) => {
                self.stage = BuildStage::Done;
                Ok(report)
            }
            Err(err) => {
                let stage = self.stage;
                self.stage = BuildStage::Failed;
                Err(BuildError {
                    stage,
                    source: err.into(),
                })
            }
        }
    }

    fn run_stages(&mut self) -> Result<BuildReport> {
        let config = self.config;
        let build = &config.build;
        let mut report = BuildReport::default();

        self.stage = BuildStage::CopyingAssets;
        prepare_output(&build.output, build.clean)?;
        report.assets_copied = copy_static(&build.static_dir, &build.output, build.incremental_assets)
            .context("failed to copy static assets")?;

        self.stage = BuildStage::LoadingTemplates;
        let registry = TemplateRegistry::load(&build.templates, &build.pages)?;

        self.stage = BuildStage::LoadingContent;
        let (drafts, published): (Vec<Post>, Vec<Post>) =
            load_posts(&config.blog_dir(), &build.blog.extension)?
                .into_iter()
                .partition(|post| post.draft);
        report.drafts = drafts.len();
        let mut published = dedup_slugs(published);
        newest_first(&mut published);
        let projects = load_projects(&config.projects_dir(), &build.projects.categories)?;

        let site = SiteModel::new(
            &config.base,
            Sections {
                blog: published,
                projects,
            },
        );
        let progress = ProgressBars::new_filtered(&[
            ("pages", registry.pages().len()),
            ("posts", site.sections.blog.len()),
        ]);
        let tick = |name: &str| {
            if let Some(progress) = &progress {
                progress.inc_by_name(name);
            }
        };

        self.stage = BuildStage::ComposingPages;
        let composer = PageComposer::new(&registry, &site)?;
        registry.pages().par_iter().try_for_each(|rel| -> Result<()> {
            let html = composer
                .compose_page(rel)
                .with_context(|| format!("in page {}", rel.display()))?;
            write_output(&build.output.join(rel), &html)?;
            tick("pages");
            Ok(())
        })?;
        report.pages = registry.pages().len();

        self.stage = BuildStage::ComposingPosts;
        if !site.sections.blog.is_empty() {
            registry.require(&build.blog.template)?;
        }
        let blog_output = config.blog_output_dir();
        prune_stale_posts(config, &registry, &site.sections.blog)?;
        site.sections.blog.par_iter().try_for_each(|post| -> Result<()> {
            let html = composer
                .compose_post(&build.blog.template, post)
                .with_context(|| format!("in post {}", post.source.display()))?;
            write_output(&blog_output.join(&post.slug), &html)?;
            tick("posts");
            Ok(())
        })?;
        report.posts = site.sections.blog.len();

        Ok(report)
    }
}

/// Build the site once and log what was produced.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let report = SiteBuilder::new(config).run()?;
    log!("build"; "{report}");
    Ok(report)
}

/// Create the output directory, wiping it first when `clean` is set.
fn prepare_output(output: &Path, clean: bool) -> Result<()> {
    if clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clear output directory {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("failed to create output directory {}", output.display()))
}

fn write_output(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))
}

/// Remove rendered posts no published post writes any more.
///
/// Only `.html` files directly in the blog output directory are touched,
/// and files a page or a static file also produces there are kept.
fn prune_stale_posts(
    config: &SiteConfig,
    registry: &TemplateRegistry,
    posts: &[Post],
) -> Result<()> {
    let build = &config.build;
    let blog_output = config.blog_output_dir();
    let entries = match fs::read_dir(&blog_output) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read {}", blog_output.display()));
        }
    };

    let mut claimed: FxHashSet<PathBuf> =
        posts.iter().map(|post| blog_output.join(&post.slug)).collect();
    claimed.extend(registry.pages().iter().map(|rel| build.output.join(rel)));

    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read {}", blog_output.display()))?
            .path();
        if !path.is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some("html")
            || claimed.contains(&path)
        {
            continue;
        }
        let rel = path.strip_prefix(&build.output).unwrap_or(&path);
        if build.static_dir.join(rel).is_file() {
            continue;
        }
        fs::remove_file(&path)
            .with_context(|| format!("failed to remove stale post {}", path.display()))?;
        log!("build"; "removed stale post {}", rel.display());
    }
    Ok(())
}

/// Keep only the last-discovered post for each output slug.
fn dedup_slugs(posts: Vec<Post>) -> Vec<Post> {
    let mut last: FxHashMap<&str, usize> = FxHashMap::default();
    for (index, post) in posts.iter().enumerate() {
        if let Some(previous) = last.insert(&post.slug, index) {
            log!(
                "warn";
                "{} and {} both write blog/{}, keeping the latter",
                posts[previous].source.display(),
                post.source.display(),
                post.slug
            );
        }
    }
    let keep: Vec<usize> = {
        let mut keep: Vec<_> = last.into_values().collect();
        keep.sort_unstable();
        keep
    };

    posts
        .into_iter()
        .enumerate()
        .filter(|(index, _)| keep.binary_search(index).is_ok())
        .map(|(_, post)| post)
        .collect()
}
