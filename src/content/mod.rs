//! Content loading: markdown posts and project records.
//!
//! ```text
//! content/
//! ├── blog/                 ──► load_posts()     ──► Vec<Post>
//! │   └── 2023/hello.md
//! └── projects/
//!     ├── featured/         ──► load_projects()  ──► ProjectCatalog
//!     │   └── tools.yaml        (one or more YAML documents)
//!     └── mini/
//!         └── widget.json
//! ```
//!
//! Both loaders fail the whole load on I/O or decode errors. Files with an
//! unexpected extension are skipped with a notice.

pub mod front_matter;
pub mod markdown;
pub mod order;
mod posts;
mod projects;

pub use order::{Dated, newest_first};
pub use posts::{Post, load_posts, slug_for};
pub use projects::{Project, ProjectCatalog, load_projects};

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Fatal content loading errors.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content directory not found: `{}`", .0.display())]
    MissingDir(PathBuf),

    #[error("failed to walk `{}`", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed project record in `{}` (document {document})", path.display())]
    Yaml {
        path: PathBuf,
        document: usize,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("malformed project record in `{}`", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Collect all files under `dir` recursively, in file-name order.
///
/// Sorting makes discovery order independent of the filesystem, which
/// keeps same-date ordering and rebuild output deterministic.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    if !dir.is_dir() {
        return Err(ContentError::MissingDir(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|source| ContentError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_str().unwrap_or_default();
        if entry.file_type().is_file() && !IGNORED_FILES.contains(&name) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Lowercased file extension, if any.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// `path` relative to `root`, for notices.
fn rel(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
