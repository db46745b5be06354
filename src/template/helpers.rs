//! Rendering helpers available as filters in every template.
//!
//! | Filter         | Example                                             | Output            |
//! |----------------|-----------------------------------------------------|-------------------|
//! | `noescape`     | `{{ post.body \| noescape }}`                       | markup, verbatim  |
//! | `getdomain`    | `{{ "https://sub.example.com" \| getdomain }}`      | `example`         |
//! | `gettld`       | `{{ "https://sub.example.com" \| gettld }}`         | `com`             |
//! | `geturltag`    | `{{ "demo:https://x.io" \| geturltag }}`            | `demo`            |
//! | `removeurltag` | `{{ "demo:https://x.io" \| removeurltag }}`         | `https://x.io`    |
//!
//! A tagged URL attaches a display category to a link, e.g.
//! `youtube:https://youtube.com/...` or `download:https://github.com/...`.

use std::collections::HashMap;
use tera::{Filter, Tera, Value};
use thiserror::Error;
use url::Url;

/// Errors raised by the URL helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error("`{url}` is not a valid URL")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("`{0}` has no host")]
    NoHost(String),

    #[error("host `{0}` has no label before its top-level domain")]
    NoDomainLabel(String),
}

/// Host labels of `url`, ignoring a trailing root dot.
fn host_labels(url: &str) -> Result<Vec<String>, HelperError> {
    let parsed = Url::parse(url).map_err(|source| HelperError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let host = parsed
        .host_str()
        .map(|h| h.trim_end_matches('.'))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| HelperError::NoHost(url.to_string()))?;
    Ok(host.split('.').map(str::to_string).collect())
}

/// Second-from-last host label: `https://sub.example.com` → `example`.
///
/// A single-label host such as `localhost` has no such label and is an error.
pub fn domain(url: &str) -> Result<String, HelperError> {
    let mut labels = host_labels(url)?;
    if labels.len() < 2 {
        return Err(HelperError::NoDomainLabel(labels.concat()));
    }
    labels.pop();
    Ok(labels.pop().unwrap_or_default())
}

/// Last host label: `https://sub.example.com` → `com`.
pub fn tld(url: &str) -> Result<String, HelperError> {
    Ok(host_labels(url)?.pop().unwrap_or_default())
}

/// Tag of a tagged URL: everything before the first colon.
/// A string without a colon is all tag.
pub fn url_tag(tagged: &str) -> &str {
    tagged.split_once(':').map_or(tagged, |(tag, _)| tag)
}

/// URL of a tagged URL: everything after the first colon, later colons kept.
/// A string without a colon has no URL.
pub fn remove_url_tag(tagged: &str) -> &str {
    tagged.split_once(':').map_or("", |(_, rest)| rest)
}

// ============================================================================
// Tera bindings
// ============================================================================

/// The fixed helper set bound into every template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    NoEscape,
    GetDomain,
    GetTld,
    GetUrlTag,
    RemoveUrlTag,
}

impl Helper {
    pub const ALL: [Self; 5] = [
        Self::NoEscape,
        Self::GetDomain,
        Self::GetTld,
        Self::GetUrlTag,
        Self::RemoveUrlTag,
    ];

    /// Name templates use to call the helper.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoEscape => "noescape",
            Self::GetDomain => "getdomain",
            Self::GetTld => "gettld",
            Self::GetUrlTag => "geturltag",
            Self::RemoveUrlTag => "removeurltag",
        }
    }

    fn apply(self, input: &str) -> Result<String, HelperError> {
        match self {
            Self::NoEscape => Ok(input.to_string()),
            Self::GetDomain => domain(input),
            Self::GetTld => tld(input),
            Self::GetUrlTag => Ok(url_tag(input).to_string()),
            Self::RemoveUrlTag => Ok(remove_url_tag(input).to_string()),
        }
    }
}

impl Filter for Helper {
    fn filter(&self, value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        if *self == Self::NoEscape && !value.is_string() {
            return Ok(value.clone());
        }
        let input = value.as_str().ok_or_else(|| {
            tera::Error::msg(format!("`{}` expects a string, got `{value}`", self.name()))
        })?;
        self.apply(input)
            .map(Value::String)
            .map_err(|err| tera::Error::msg(format!("`{}`: {err}", self.name())))
    }

    /// `noescape` output bypasses auto-escaping; the caller vouches for it.
    fn is_safe(&self) -> bool {
        *self == Self::NoEscape
    }
}

/// Register every helper on `tera`.
pub fn register(tera: &mut Tera) {
    for helper in Helper::ALL {
        tera.register_filter(helper.name(), helper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    fn render(source: &str, ctx: &Context) -> tera::Result<String> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![""]);
        register(&mut tera);
        tera.add_raw_template("t", source)?;
        tera.render("t", ctx)
    }

    #[test]
    fn test_url_tag_first_colon_only() {
        assert_eq!(url_tag("demo:https://x.io/a:b"), "demo");
        assert_eq!(remove_url_tag("demo:https://x.io/a:b"), "https://x.io/a:b");
    }

    #[test]
    fn test_url_tag_without_colon() {
        assert_eq!(url_tag("plain"), "plain");
        assert_eq!(remove_url_tag("plain"), "");
        assert_eq!(remove_url_tag("tag:"), "");
    }

    #[test]
    fn test_domain_and_tld() {
        assert_eq!(domain("https://sub.example.com").unwrap(), "example");
        assert_eq!(tld("https://sub.example.com").unwrap(), "com");
        assert_eq!(domain("https://github.com/user/repo").unwrap(), "github");
        assert_eq!(tld("https://example.co.uk/").unwrap(), "uk");
    }

    #[test]
    fn test_trailing_root_dot_ignored() {
        assert_eq!(domain("https://example.com./").unwrap(), "example");
        assert_eq!(tld("https://example.com./").unwrap(), "com");
    }

    #[test]
    fn test_single_label_host() {
        assert_eq!(
            domain("http://localhost:8080"),
            Err(HelperError::NoDomainLabel("localhost".into()))
        );
        assert_eq!(tld("http://localhost:8080").unwrap(), "localhost");
    }

    #[test]
    fn test_garbage_urls() {
        assert!(matches!(domain("not a url"), Err(HelperError::InvalidUrl { .. })));
        assert!(matches!(tld(""), Err(HelperError::InvalidUrl { .. })));
        assert_eq!(
            domain("mailto:me@example.com"),
            Err(HelperError::NoHost("mailto:me@example.com".into()))
        );
    }

    #[test]
    fn test_helper_names_are_unique() {
        let mut names: Vec<_> = Helper::ALL.iter().map(|h| h.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Helper::ALL.len());
    }

    #[test]
    fn test_filters_in_template() {
        let mut ctx = Context::new();
        ctx.insert("link", "github:https://github.com/example/quill");
        let out = render(
            "{{ link | geturltag }} {{ link | removeurltag | getdomain }}.{{ link | removeurltag | gettld }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "github github.com");
    }

    #[test]
    fn test_noescape_bypasses_autoescape() {
        let mut ctx = Context::new();
        ctx.insert("html", "<em>hi</em>");
        assert_eq!(render("{{ html }}", &ctx).unwrap(), "&lt;em&gt;hi&lt;&#x2F;em&gt;");
        assert_eq!(render("{{ html | noescape }}", &ctx).unwrap(), "<em>hi</em>");
    }

    #[test]
    fn test_helper_error_fails_render() {
        let mut ctx = Context::new();
        ctx.insert("url", "http://localhost");
        let err = render("{{ url | getdomain }}", &ctx).unwrap_err();
        let chain = format!("{err:?}");
        assert!(chain.contains("localhost"));
    }

    #[test]
    fn test_non_string_input_is_an_error() {
        let mut ctx = Context::new();
        ctx.insert("n", &3);
        assert!(render("{{ n | gettld }}", &ctx).is_err());
        assert_eq!(render("{{ n | noescape }}", &ctx).unwrap(), "3");
    }
}
