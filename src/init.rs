//! Site initialization module.
//!
//! Creates a new site that builds out of the box.

use crate::config::{CONFIG_FILE, SiteConfig};
use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

const MAIN_TEMPLATE: &str = include_str!("embed/init/main.html");
const POST_TEMPLATE: &str = include_str!("embed/init/post.html");
const INDEX_PAGE: &str = include_str!("embed/init/index.html");
const STYLESHEET: &str = include_str!("embed/init/style.css");
const HELLO_POST: &str = include_str!("embed/init/hello.md");

/// Create a new site at the configured root.
///
/// Without a name the site is created in the current directory, which
/// must be empty; with a name the target subdirectory must be empty or absent.
pub fn new_site(config: &SiteConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    if !is_dir_empty(root)? {
        if has_name {
            bail!("`{}` already exists and is not empty.", root.display());
        }
        bail!(
            "Current directory is not empty. Use `quill init <SITE_NAME>` to create in a subdirectory."
        );
    }

    init_site_structure(config)?;
    init_default_config(root)?;
    init_starter_files(config)?;
    init_ignored_files(root, &config.build.output)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .next()
        .is_none())
}

/// Directories every site needs.
fn site_dirs(config: &SiteConfig) -> Vec<PathBuf> {
    let build = &config.build;
    let mut dirs = vec![
        build.static_dir.clone(),
        build.output.clone(),
        build.templates.clone(),
        build.pages.clone(),
        config.blog_dir(),
    ];
    dirs.extend(
        build
            .projects
            .categories
            .iter()
            .map(|category| config.project_dir(category)),
    );
    dirs
}

fn init_site_structure(config: &SiteConfig) -> Result<()> {
    for path in site_dirs(config) {
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

/// Write default configuration, naming the site after its directory.
fn init_default_config(root: &Path) -> Result<()> {
    let mut config = SiteConfig::default();
    config.base.site_name = root
        .file_name()
        .map_or_else(|| "My Site".to_string(), |name| name.to_string_lossy().into_owned());

    let content = toml::to_string_pretty(&config)?;
    fs::write(root.join(CONFIG_FILE), content)
        .with_context(|| format!("Failed to write {CONFIG_FILE}"))?;
    Ok(())
}

fn init_starter_files(config: &SiteConfig) -> Result<()> {
    let build = &config.build;
    let files = [
        (build.templates.join("main.html"), MAIN_TEMPLATE),
        (
            build.templates.join(&build.blog.template).with_extension("html"),
            POST_TEMPLATE,
        ),
        (build.pages.join("index.html"), INDEX_PAGE),
        (build.static_dir.join("style.css"), STYLESHEET),
        (
            config.blog_dir().join("hello").with_extension(&build.blog.extension),
            HELLO_POST,
        ),
    ];
    for (path, content) in files {
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Keep build output out of version control.
fn init_ignored_files(root: &Path, output: &Path) -> Result<()> {
    let output = output.strip_prefix(root).unwrap_or(output);
    let path = root.join(".gitignore");
    if !path.exists() {
        fs::write(&path, format!("/{}/\n", output.display()))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_site;
    use tempfile::TempDir;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.resolve_paths(root, Path::new(CONFIG_FILE));
        config
    }

    #[test]
    fn test_new_site_scaffolds_everything() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("blog-site");
        new_site(&config_at(&root), true).unwrap();

        for rel in [
            "quill.toml",
            ".gitignore",
            "templates/main.html",
            "templates/post.html",
            "pages/index.html",
            "static/style.css",
            "content/blog/hello.md",
        ] {
            assert!(root.join(rel).is_file(), "missing {rel}");
        }
        for rel in ["public", "content/projects/featured", "content/projects/retired"] {
            assert!(root.join(rel).is_dir(), "missing {rel}");
        }
        assert_eq!(fs::read_to_string(root.join(".gitignore")).unwrap(), "/public/\n");
    }

    #[test]
    fn test_default_config_names_site_after_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("rytc.io");
        new_site(&config_at(&root), true).unwrap();

        let config = SiteConfig::from_path(&root.join(CONFIG_FILE)).unwrap();
        assert_eq!(config.base.site_name, "rytc.io");
        assert_eq!(config.serve.port, 5277);
    }

    #[test]
    fn test_fresh_site_builds() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("site");
        new_site(&config_at(&root), true).unwrap();

        let mut config = SiteConfig::from_path(&root.join(CONFIG_FILE)).unwrap();
        config.resolve_paths(&root, Path::new(CONFIG_FILE));
        config.validate().unwrap();
        let report = build_site(&config).unwrap();

        assert_eq!(report.pages, 1);
        assert_eq!(report.drafts, 1);
        let index = fs::read_to_string(root.join("public/index.html")).unwrap();
        assert!(index.contains("<title>site</title>"));
        assert!(root.join("public/style.css").is_file());
    }

    #[test]
    fn test_refuses_non_empty_target() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let err = new_site(&config_at(dir.path()), false).unwrap_err();
        assert!(err.to_string().contains("not empty"));
        assert!(!dir.path().join(CONFIG_FILE).exists());

        let err = new_site(&config_at(dir.path()), true).unwrap_err();
        assert!(err.to_string().contains("not empty"));
    }

    #[test]
    fn test_empty_current_dir_is_accepted() {
        let dir = TempDir::new().unwrap();
        new_site(&config_at(dir.path()), false).unwrap();
        assert!(dir.path().join(CONFIG_FILE).is_file());
    }
}
