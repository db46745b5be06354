//! Page composition: inner template, then the `main` layout.
//!
//! ```text
//! pages/about.html ──render(SiteModel)──────────────┐
//!                                                   ├──► main(LayoutContext) ──► HTML
//! blog/hello.md ──render(post template, PostContext)┘
//! ```
//!
//! The inner result is handed to the layout as `content`; nothing is
//! stashed between the two renders.

use crate::config::BaseConfig;
use crate::content::{Post, ProjectCatalog};
use crate::template::{LAYOUT, TemplateError, TemplateRegistry, page_name};
use serde::Serialize;
use std::path::Path;

/// Everything templates can see about the site.
///
/// Serialized flat: `{{ site_name }}`, `{{ author }}`, `{{ sections.blog }}`,
/// `{{ sections.projects.featured }}`.
#[derive(Debug, Serialize)]
pub struct SiteModel<'a> {
    #[serde(flatten)]
    pub base: &'a BaseConfig,
    pub sections: Sections,
}

/// Ordered content per section.
#[derive(Debug, Default, Serialize)]
pub struct Sections {
    /// Published posts, newest first.
    pub blog: Vec<Post>,
    pub projects: ProjectCatalog,
}

impl<'a> SiteModel<'a> {
    pub const fn new(base: &'a BaseConfig, sections: Sections) -> Self {
        Self { base, sections }
    }
}

/// Context of a post template: the site plus `post`.
#[derive(Serialize)]
struct PostContext<'a> {
    #[serde(flatten)]
    site: &'a SiteModel<'a>,
    post: &'a Post,
}

/// Context of the layout: the site plus the already-rendered `content`.
#[derive(Serialize)]
struct LayoutContext<'a> {
    #[serde(flatten)]
    site: &'a SiteModel<'a>,
    page_title: Option<&'a str>,
    content: &'a str,
}

/// Renders pages and posts through the layout. Shared across threads.
pub struct PageComposer<'a> {
    registry: &'a TemplateRegistry,
    site: &'a SiteModel<'a>,
}

impl<'a> PageComposer<'a> {
    /// Fails when the layout template is missing.
    pub fn new(registry: &'a TemplateRegistry, site: &'a SiteModel<'a>) -> Result<Self, TemplateError> {
        registry.require(LAYOUT)?;
        Ok(Self { registry, site })
    }

    /// Render the page template at `rel` (relative to the pages directory).
    pub fn compose_page(&self, rel: &Path) -> Result<String, TemplateError> {
        let inner = self.registry.render(&page_name(rel), self.site)?;
        self.wrap(None, &inner)
    }

    /// Render `post` with `template`.
    pub fn compose_post(&self, template: &str, post: &Post) -> Result<String, TemplateError> {
        let context = PostContext {
            site: self.site,
            post,
        };
        let inner = self.registry.render(template, &context)?;
        self.wrap(Some(post.title.trim()), &inner)
    }

    fn wrap(&self, page_title: Option<&str>, content: &str) -> Result<String, TemplateError> {
        let context = LayoutContext {
            site: self.site,
            page_title,
            content,
        };
        self.registry.render(LAYOUT, &context)
    }
}
