//! `interpretAs` policy for markup runs
//!
//! The service never sees markup, only its interpretation. Interpretations keep the line
//! structure of the source (same number of newlines) so sentence and paragraph detection on the
//! service side lines up with what the author sees.

use once_cell::sync::Lazy;
use regex::Regex;

static ATX_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]{0,3}#{1,6}[ \t]*$").expect("valid regex"));

static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<indent>[ \t>]*)(?:[*+-]|\d{1,9}[.)])(?:[ \t]+\[[ xX]\])?[ \t]+$")
        .expect("valid regex")
});

/// Interpretation of a Markdown markup run.
pub fn markdown(markup: &str) -> Option<String> {
    if let Some(redacted) = inline_code(markup) {
        return Some(redacted);
    }

    let newlines = markup.matches('\n').count();
    let mut interpretation = "\n".repeat(newlines);
    let tail = markup.rsplit('\n').next().unwrap_or(markup);

    if ATX_HEADING.is_match(tail) {
        interpretation.push_str("# ");
    } else if let Some(captures) = LIST_MARKER.captures(tail) {
        let nested = captures
            .name("indent")
            .map(|indent| indent.as_str().trim_start_matches('>').len() >= 2)
            .unwrap_or(false);
        interpretation.push_str(if nested { "** " } else { "* " });
    }

    if interpretation.is_empty() {
        None
    } else {
        Some(interpretation)
    }
}

/// Redact a backtick code span: the delimiters are kept, every code unit between them becomes
/// `#`. Returns `None` when `markup` is not a single code span.
pub fn inline_code(markup: &str) -> Option<String> {
    let fence = markup.len() - markup.trim_start_matches('`').len();
    if fence == 0 || markup.len() <= fence * 2 {
        return None;
    }
    let closing = markup.len() - markup.trim_end_matches('`').len();
    if closing != fence {
        return None;
    }
    let ticks = &markup[..fence];
    let inner = &markup[fence..markup.len() - fence];
    if inner.contains(ticks) {
        return None;
    }
    let fill = "#".repeat(inner.encode_utf16().count());
    Some(format!("{ticks}{fill}{ticks}"))
}

/// Interpretation of an HTML markup run.
pub fn html(markup: &str, block: bool) -> Option<String> {
    let newlines = markup.matches('\n').count();
    if newlines > 0 {
        return Some("\n".repeat(newlines));
    }
    block.then(|| "\n\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_inline_code() {
        assert_eq!(inline_code("`secret`"), Some("`######`".to_string()));
        assert_eq!(inline_code("``a ` b``"), Some("``#####``".to_string()));
        assert_eq!(inline_code("``"), None);
        assert_eq!(inline_code("**"), None);
    }

    #[test]
    fn headings_and_bullets_get_placeholders() {
        assert_eq!(markdown("\n\n## "), Some("\n\n# ".to_string()));
        assert_eq!(markdown("# "), Some("# ".to_string()));
        assert_eq!(markdown("\n- "), Some("\n* ".to_string()));
        assert_eq!(markdown("\n  * "), Some("\n** ".to_string()));
        assert_eq!(markdown("\n1. "), Some("\n* ".to_string()));
    }

    #[test]
    fn other_markup_keeps_newline_count() {
        assert_eq!(markdown("**"), None);
        assert_eq!(markdown("](http://x)\n\n"), Some("\n\n".to_string()));
    }

    #[test]
    fn html_block_tags_separate_paragraphs() {
        assert_eq!(html("<p>", true), Some("\n\n".to_string()));
        assert_eq!(html("<b>", false), None);
        assert_eq!(html("<div\n class=\"x\">", true), Some("\n".to_string()));
    }
}
