//! Project records, grouped by category.
//!
//! A YAML file may hold several records separated by `---`; a JSON file
//! holds exactly one. Unknown fields are rejected: a record that does not
//! match the schema fails the whole load instead of rendering half-empty.

use super::{ContentError, Dated, collect_files, extension_of, newest_first, rel};
use crate::log;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::{
    collections::BTreeMap,
    fs,
    path::Path,
};

/// One project record.
///
/// ```yaml
/// title: quill
/// subtitle: static site generator
/// date: 2023-05-01
/// tags: [rust, cli]
/// image: /img/quill.png
/// imageURL: https://example.com/quill
/// urls:
///   - github:https://github.com/example/quill
///   - demo:https://example.com/demo
/// description: Builds this site.
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default, rename = "imageURL", alias = "image_url")]
    pub image_url: String,
    /// Tagged URLs (`tag:url`).
    #[serde(default, rename = "urls", alias = "links")]
    pub links: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Dated for Project {
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Projects per category, each list sorted newest first.
pub type ProjectCatalog = BTreeMap<String, Vec<Project>>;

/// Load and sort every configured category under `root`.
pub fn load_projects(root: &Path, categories: &[String]) -> Result<ProjectCatalog, ContentError> {
    let mut catalog = ProjectCatalog::new();
    for category in categories {
        let mut projects = load_category(root, category)?;
        newest_first(&mut projects);
        log!("content"; "{} {} projects", projects.len(), category);
        catalog.insert(category.clone(), projects);
    }
    Ok(catalog)
}

/// Decode every record in one category directory, in discovery order.
fn load_category(root: &Path, category: &str) -> Result<Vec<Project>, ContentError> {
    let mut projects = Vec::new();
    for path in collect_files(&root.join(category))? {
        match extension_of(&path).as_deref() {
            Some("yaml" | "yml") => projects.extend(decode_yaml(&path, &read(&path)?)?),
            Some("json") => projects.push(decode_json(&path, &read(&path)?)?),
            _ => log!("content"; "skipping project file {}: unknown file extension", rel(&path, root)),
        }
    }
    Ok(projects)
}

fn read(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode each YAML document independently.
///
/// Empty documents hold no record and are skipped, so a trailing `---`
/// or a comment-only file is fine. `document` in errors is 1-based.
fn decode_yaml(path: &Path, text: &str) -> Result<Vec<Project>, ContentError> {
    let mut projects = Vec::new();
    for (index, document) in serde_yaml_ng::Deserializer::from_str(text).enumerate() {
        let malformed = |source: serde_yaml_ng::Error| ContentError::Yaml {
            path: path.to_path_buf(),
            document: index + 1,
            source,
        };
        let value = Value::deserialize(document).map_err(malformed)?;
        if value.is_null() {
            continue;
        }
        projects.push(serde_yaml_ng::from_value(value).map_err(malformed)?);
    }
    Ok(projects)
}

fn decode_json(path: &Path, text: &str) -> Result<Project, ContentError> {
    serde_json::from_str(text).map_err(|source| ContentError::Json {
        path: path.to_path_buf(),
        source,
    })
}
