//! `[base]` section configuration.
//!
//! Contains basic site information exposed to every template.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quill.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// site_name = "rytc.io"
/// description = "Projects and writing"
/// author = "Alice"
/// url = "https://rytc.io"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site name, available to templates as `site_name`.
    pub site_name: String,

    /// Site description for meta tags.
    #[serde(default)]
    pub description: String,

    /// Author name for meta tags.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Public base URL of the deployed site.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,
}
