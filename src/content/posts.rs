//! Markdown blog posts.

use super::{
    ContentError, Dated, collect_files, extension_of,
    front_matter::{self, FrontMatterWarning},
    markdown, rel,
};
use crate::log;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A rendered blog post. Built once per build pass and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub title: String,
    /// Serialized as `YYYY-MM-DD`, or null when undated.
    pub date: Option<NaiveDate>,
    pub draft: bool,
    /// Rendered HTML body.
    pub body: String,
    /// Output file name under the blog output directory.
    pub slug: String,
    #[serde(skip)]
    pub source: PathBuf,
}

impl Dated for Post {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Post {
    /// Split front matter, render the body and derive the slug.
    pub fn parse(source_path: &Path, text: &str) -> (Self, Vec<FrontMatterWarning>) {
        let split = front_matter::split(text);
        let post = Self {
            title: split.meta.title,
            date: split.meta.date,
            draft: split.meta.draft,
            body: markdown::render(split.body),
            slug: slug_for(source_path),
            source: source_path.to_path_buf(),
        };
        (post, split.warnings)
    }
}

/// Output slug: the base file name with its extension replaced by `.html`.
///
/// `content/blog/2023/hello.md` → `hello.html`
pub fn slug_for(path: &Path) -> String {
    let name = path.file_name().map(Path::new).unwrap_or(path);
    name.with_extension("html").to_string_lossy().into_owned()
}

/// Load every post under `dir`, in discovery order.
///
/// Files without the expected `extension` are skipped with a notice.
/// A missing directory or an unreadable post fails the whole load.
/// Files are read and rendered in parallel; the returned order is the
/// discovery order regardless.
pub fn load_posts(dir: &Path, extension: &str) -> Result<Vec<Post>, ContentError> {
    let extension = extension.to_ascii_lowercase();
    let files: Vec<PathBuf> = collect_files(dir)?
        .into_iter()
        .filter(|path| {
            let accepted = extension_of(path).as_deref() == Some(extension.as_str());
            if !accepted {
                log!("content"; "skipping {}: unknown file extension", rel(path, dir));
            }
            accepted
        })
        .collect();

    let parsed = files
        .par_iter()
        .map(|path| {
            let text = fs::read_to_string(path).map_err(|source| ContentError::Read {
                path: path.clone(),
                source,
            })?;
            Ok(Post::parse(path, &text))
        })
        .collect::<Result<Vec<_>, ContentError>>()?;

    let posts = parsed
        .into_iter()
        .map(|(post, warnings)| {
            for warning in warnings {
                log!("warn"; "{}: {warning}", rel(&post.source, dir));
            }
            post
        })
        .collect();

    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_slug_for() {
        assert_eq!(slug_for(Path::new("content/blog/hello.md")), "hello.html");
        assert_eq!(slug_for(Path::new("2023/v1.2-notes.md")), "v1.2-notes.html");
        assert_eq!(slug_for(Path::new("plain")), "plain.html");
    }

    #[test]
    fn test_parse_post() {
        let (post, warnings) = Post::parse(
            Path::new("blog/hello.md"),
            "---\ntitle:Hello\ndate: 2023-05-01\n---\n# Hello\n",
        );
        assert!(warnings.is_empty());
        assert_eq!(post.title, "Hello");
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2023, 5, 1));
        assert!(!post.draft);
        assert_eq!(post.body, "<h1>Hello</h1>\n");
        assert_eq!(post.slug, "hello.html");
    }

    #[test]
    fn test_post_without_front_matter_renders_everything() {
        let (post, warnings) = Post::parse(Path::new("raw.md"), "just *text*\n");
        assert_eq!(warnings, [FrontMatterWarning::MissingDelimiter]);
        assert_eq!(post.body, "<p>just <em>text</em></p>\n");
        assert_eq!(post.date, None);
    }

    #[test]
    fn test_post_serializes_iso_date() {
        let (post, _) = Post::parse(Path::new("a.md"), "---\ndate: 2023-05-01\n---\n");
        let value = serde_json::to_value(&post).unwrap();
        assert_eq!(value["date"], "2023-05-01");
        assert_eq!(value["slug"], "a.html");
        assert!(value.get("source").is_none());
    }

    #[test]
    fn test_load_posts_recursive_discovery_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.md", "---\ntitle:B\n---\n");
        write(dir.path(), "a.md", "---\ntitle:A\n---\n");
        write(dir.path(), "2023/deep/c.md", "---\ntitle:C\n---\n");

        let posts = load_posts(dir.path(), "md").unwrap();
        let titles: Vec<_> = posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["C", "A", "B"]);
        assert_eq!(posts[0].slug, "c.html");
    }

    #[test]
    fn test_load_posts_skips_unknown_extensions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "post.md", "---\ntitle:Kept\n---\n");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "image.png", "ignored");

        let posts = load_posts(dir.path(), "md").unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Kept");
    }

    #[test]
    fn test_load_posts_missing_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = load_posts(&dir.path().join("blog"), "md").unwrap_err();
        assert!(matches!(err, ContentError::MissingDir(_)));
    }

    #[test]
    fn test_load_posts_unreadable_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        // invalid UTF-8 cannot be read as text
        fs::write(dir.path().join("bad.md"), [0xff, 0xfe, 0x00]).unwrap();
        write(dir.path(), "good.md", "---\ntitle:Good\n---\n");

        let err = load_posts(dir.path(), "md").unwrap_err();
        match err {
            ContentError::Read { path, .. } => assert!(path.ends_with("bad.md")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
