//! Regex-driven tag scanner.
//!
//! Tags never span lines, so the source is scanned one line at a time.
//! Sigils are left in the tag text; interpreting them is the builder's job.

use std::sync::LazyLock;

use regex::Regex;

use crate::token::RawTag;
use crate::Position;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\{?[#^/]?[A-Za-z0-9_.]+\}?\}\}").expect("tag pattern must compile")
});

/// Scan a single line for tags.
pub fn scan_line(line_no: usize, line: &str) -> impl Iterator<Item = RawTag> + '_ {
    TAG_PATTERN
        .find_iter(line)
        .map(move |m| RawTag::new(Position::new(line_no, m.start()), m.as_str()))
}

/// Scan a whole template, line by line. Blank lines are skipped.
pub fn scan(source: &str) -> impl Iterator<Item = RawTag> + '_ {
    source
        .split('\n')
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .flat_map(|(line_no, line)| scan_line(line_no, line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn texts(source: &str) -> Vec<(usize, usize, String)> {
        scan(source)
            .map(|t| (t.position.line, t.position.column, t.text))
            .collect()
    }

    #[test]
    fn test_plain_text() {
        assert!(texts("Hello, World!").is_empty());
    }

    #[test]
    fn test_positions() {
        assert_eq!(
            texts("Hello {{name}}!\n\n  {{#items}}{{.}}{{/items}}"),
            vec![
                (0, 6, "{{name}}".to_string()),
                (2, 2, "{{#items}}".to_string()),
                (2, 12, "{{.}}".to_string()),
                (2, 17, "{{/items}}".to_string()),
            ]
        );
    }

    #[test]
    fn test_raw_tag() {
        assert_eq!(texts("<b>{{{html}}}</b>"), vec![(0, 3, "{{{html}}}".to_string())]);
    }

    #[test]
    fn test_unmatched_braces_are_text() {
        assert!(texts("{{ name }} {{} {name}} }}{{").is_empty());
    }

    #[test]
    fn test_tag_cannot_span_lines() {
        assert!(texts("{{na\nme}}").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        assert_eq!(texts("a\r\n{{b}}\r\n"), vec![(1, 0, "{{b}}".to_string())]);
    }
}
