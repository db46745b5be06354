//! Markdown to HTML rendering.

use pulldown_cmark::{Options, Parser, html};

/// CommonMark plus the GitHub-flavoured extensions posts commonly use.
fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// Render a markdown body to an HTML fragment.
pub fn render(source: &str) -> String {
    let parser = Parser::new_ext(source, options());
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
