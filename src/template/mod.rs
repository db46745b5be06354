//! Template registry.
//!
//! Every file under the templates directory is compiled once per build and
//! keyed by its file stem (`templates/layouts/main.html` → `main`). Page
//! templates share the same registry under `pages/<relative path>` so they
//! can `{% extends "main" %}` or `{% include "nav" %}`.
//!
//! All output is HTML-escaped. Markup that is already trusted, such as a
//! rendered post body, goes through the `noescape` filter.

pub mod helpers;

use crate::content::{ContentError, collect_files};
use crate::log;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;

/// The layout every page and post is wrapped in.
pub const LAYOUT: &str = "main";

/// Key prefix for templates compiled from the pages directory.
const PAGE_PREFIX: &str = "pages";

/// Extensions treated as page templates.
const PAGE_EXTENSIONS: &[&str] = &["html", "htm"];

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template directory not found: `{}`", .0.display())]
    MissingDir(PathBuf),

    #[error("failed to scan templates")]
    Scan(#[source] ContentError),

    #[error("failed to read template `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("templates `{}` and `{}` share the name `{name}`", first.display(), second.display())]
    Duplicate {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to compile templates")]
    Compile(#[source] tera::Error),

    #[error("required template `{0}` not found")]
    Missing(String),

    #[error("failed to render template `{name}`")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

/// Compiled templates plus the page list, immutable once loaded.
pub struct TemplateRegistry {
    tera: Tera,
    /// Page templates relative to the pages directory, in discovery order.
    pages: Vec<PathBuf>,
}

impl TemplateRegistry {
    /// Compile every template and page template.
    pub fn load(templates_dir: &Path, pages_dir: &Path) -> Result<Self, TemplateError> {
        let mut sources: Vec<(String, String)> = Vec::new();
        let mut origins: FxHashMap<String, PathBuf> = FxHashMap::default();

        for path in scan(templates_dir)? {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if let Some(first) = origins.get(&name) {
                return Err(TemplateError::Duplicate {
                    name,
                    first: first.clone(),
                    second: path,
                });
            }
            sources.push((name.clone(), read(&path)?));
            origins.insert(name, path);
        }

        let mut pages = Vec::new();
        for path in scan(pages_dir)? {
            let rel = path.strip_prefix(pages_dir).unwrap_or(&path).to_path_buf();
            if !is_page(&rel) {
                log!("template"; "skipping page {}: not an html file", rel.display());
                continue;
            }
            sources.push((page_name(&rel), read(&path)?));
            pages.push(rel);
        }

        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        helpers::register(&mut tera);
        tera.add_raw_templates(sources)
            .map_err(TemplateError::Compile)?;

        Ok(Self { tera, pages })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Fail unless `name` is registered.
    pub fn require(&self, name: &str) -> Result<(), TemplateError> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(TemplateError::Missing(name.to_string()))
        }
    }

    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }

    /// Render `name` against any serializable context object.
    pub fn render<S: Serialize>(&self, name: &str, context: &S) -> Result<String, TemplateError> {
        let render_err = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let context = Context::from_serialize(context).map_err(render_err)?;
        self.tera.render(name, &context).map_err(render_err)
    }
}

/// Registry key of a page template: `blog/index.html` → `pages/blog/index.html`.
pub fn page_name(rel: &Path) -> String {
    let rel = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    format!("{PAGE_PREFIX}/{rel}")
}

fn is_page(rel: &Path) -> bool {
    rel.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn scan(dir: &Path) -> Result<Vec<PathBuf>, TemplateError> {
    collect_files(dir).map_err(|err| match err {
        ContentError::MissingDir(path) => TemplateError::MissingDir(path),
        other => TemplateError::Scan(other),
    })
}

fn read(path: &Path) -> Result<String, TemplateError> {
    fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })
}
