//! HTML tag stripping for plain-text email bodies.

use std::sync::OnceLock;

use regex::Regex;

/// Matches any markup tag, including multi-line ones.
fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex is valid"))
}

/// Derive a plain-text body from rendered HTML by removing all tags.
///
/// No entity decoding or whitespace normalisation beyond trimming the ends;
/// the templates keep their text content readable without markup.
pub fn strip_tags(html: &str) -> String {
    tag_regex().replace_all(html, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_simple_tags() {
        assert_eq!(strip_tags("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn removes_tags_with_attributes() {
        assert_eq!(
            strip_tags(r#"<a href="http://example.com">link</a>"#),
            "link"
        );
    }

    #[test]
    fn removes_multiline_tags() {
        assert_eq!(strip_tags("<div\n  class=\"x\">text</div>"), "text");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(strip_tags("no markup here"), "no markup here");
    }
}
