//! `---` delimited metadata header of markdown posts.
//!
//! ```text
//! ---
//! title:Hello: World
//! date: 2023-05-01
//! draft: false
//! ---
//! Body markdown starts here.
//! ```
//!
//! Parsing never fails. Authoring mistakes are reported as
//! [`FrontMatterWarning`]s and the post keeps best-effort defaults.

use chrono::NaiveDate;
use std::fmt;

/// Line that opens and closes the metadata block.
pub const DELIMITER: &str = "---";

/// Accepted `date` format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Typed fields recognized in the metadata block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// Everything after `title:`, verbatim.
    pub title: String,
    /// `None` when absent or unparsable; sorts as the oldest date.
    pub date: Option<NaiveDate>,
    pub draft: bool,
}

/// Non-fatal problems found while splitting a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterWarning {
    /// The first line is not `---`; the whole file is body.
    MissingDelimiter,
    /// No closing `---`; the body falls back to everything after the opening line.
    Unterminated,
    /// `date` could not be parsed as `YYYY-MM-DD`.
    InvalidDate(String),
}

impl fmt::Display for FrontMatterWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDelimiter => write!(f, "missing `{DELIMITER}` metadata start delimiter"),
            Self::Unterminated => write!(f, "metadata block is never closed with `{DELIMITER}`"),
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`, expected YYYY-MM-DD"),
        }
    }
}

/// Result of splitting a content file.
#[derive(Debug)]
pub struct Split<'a> {
    pub meta: FrontMatter,
    /// Markdown source, borrowed byte-for-byte from the input.
    pub body: &'a str,
    pub warnings: Vec<FrontMatterWarning>,
}

/// Split `source` into its metadata block and body.
pub fn split(source: &str) -> Split<'_> {
    let mut meta = FrontMatter::default();
    let mut warnings = Vec::new();
    let mut lines = source.split_inclusive('\n');

    let Some(first) = lines.next() else {
        return Split { meta, body: source, warnings };
    };
    if trim_eol(first) != DELIMITER {
        warnings.push(FrontMatterWarning::MissingDelimiter);
        return Split { meta, body: source, warnings };
    }

    let after_open = first.len();
    let mut offset = after_open;
    for line in lines {
        offset += line.len();
        let line = trim_eol(line);
        if line == DELIMITER {
            return Split {
                meta,
                body: &source[offset..],
                warnings,
            };
        }
        meta.apply(line, &mut warnings);
    }

    warnings.push(FrontMatterWarning::Unterminated);
    Split {
        meta,
        body: &source[after_open..],
        warnings,
    }
}

impl FrontMatter {
    /// Apply one `key:value` line. Unknown keys and lines without a colon are ignored.
    fn apply(&mut self, line: &str, warnings: &mut Vec<FrontMatterWarning>) {
        let Some((key, value)) = line.split_once(':') else {
            return;
        };
        match key.trim() {
            "title" => self.title = value.to_string(),
            "date" => {
                let value = value.trim();
                match NaiveDate::parse_from_str(value, DATE_FORMAT) {
                    Ok(date) => self.date = Some(date),
                    Err(_) => {
                        self.date = None;
                        warnings.push(FrontMatterWarning::InvalidDate(value.to_string()));
                    }
                }
            }
            "draft" => self.draft = value.trim() == "true",
            _ => {}
        }
    }
}

/// Strip the line terminator (`\n` or `\r\n`).
fn trim_eol(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_keeps_every_colon() {
        let split = split("---\ntitle:My: Post: Title\n---\nbody\n");
        assert_eq!(split.meta.title, "My: Post: Title");
        assert!(split.warnings.is_empty());
    }

    #[test]
    fn test_title_is_not_trimmed() {
        let split = split("---\ntitle: Hello\n---\n");
        assert_eq!(split.meta.title, " Hello");
    }

    #[test]
    fn test_all_fields() {
        let split = split("---\ntitle:Hello\ndate: 2023-05-01\ndraft: true\n---\n# Hi\n");
        assert_eq!(
            split.meta,
            FrontMatter {
                title: "Hello".into(),
                date: NaiveDate::from_ymd_opt(2023, 5, 1),
                draft: true,
            }
        );
        assert_eq!(split.body, "# Hi\n");
    }

    #[test]
    fn test_body_preserved_byte_for_byte() {
        let body = "para one\r\n\n  indented: with colon\n---\nafter rule";
        let source = format!("---\ntitle:x\n---\n{body}");
        assert_eq!(split(&source).body, body);
    }

    #[test]
    fn test_crlf_delimiters() {
        let split = split("---\r\ntitle:Win\r\ndraft: true\r\n---\r\nbody");
        assert_eq!(split.meta.title, "Win");
        assert!(split.meta.draft);
        assert_eq!(split.body, "body");
    }

    #[test]
    fn test_draft_is_case_sensitive() {
        assert!(!split("---\ndraft: True\n---\n").meta.draft);
        assert!(!split("---\ndraft: yes\n---\n").meta.draft);
        assert!(!split("---\ntitle:x\n---\n").meta.draft);
        assert!(split("---\ndraft:true  \n---\n").meta.draft);
    }

    #[test]
    fn test_invalid_date_is_a_warning() {
        let split = split("---\ntitle:x\ndate: 05-01-2023\n---\nbody");
        assert_eq!(split.meta.date, None);
        assert_eq!(
            split.warnings,
            [FrontMatterWarning::InvalidDate("05-01-2023".into())]
        );
        assert_eq!(split.body, "body");
    }

    #[test]
    fn test_missing_delimiter_keeps_whole_file() {
        let source = "# No metadata\n\ntitle: not parsed\n";
        let split = split(source);
        assert_eq!(split.body, source);
        assert_eq!(split.meta, FrontMatter::default());
        assert_eq!(split.warnings, [FrontMatterWarning::MissingDelimiter]);
    }

    #[test]
    fn test_unterminated_block_keeps_fields_and_content() {
        let split = split("---\ntitle:Half\ndate: 2020-01-02\nsome text");
        assert_eq!(split.meta.title, "Half");
        assert_eq!(split.meta.date, NaiveDate::from_ymd_opt(2020, 1, 2));
        assert_eq!(split.body, "title:Half\ndate: 2020-01-02\nsome text");
        assert_eq!(split.warnings, [FrontMatterWarning::Unterminated]);
    }

    #[test]
    fn test_unknown_keys_and_plain_lines_ignored() {
        let split = split("---\nauthor: me\njust words\ntitle:t\n---\n");
        assert_eq!(split.meta.title, "t");
        assert!(split.warnings.is_empty());
    }

    #[test]
    fn test_empty_file() {
        let split = split("");
        assert_eq!(split.body, "");
        assert!(split.warnings.is_empty());
    }

    #[test]
    fn test_empty_body_after_block() {
        let split = split("---\ntitle:x\n---");
        assert_eq!(split.body, "");
        assert!(split.warnings.is_empty());
    }

    #[test]
    fn test_warning_display() {
        assert_eq!(
            FrontMatterWarning::InvalidDate("soon".into()).to_string(),
            "invalid date `soon`, expected YYYY-MM-DD"
        );
    }
}
