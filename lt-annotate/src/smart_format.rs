//! Typographic smart formatting
//!
//! Rewrites straight quotes, double/triple hyphens and triple dots inside prose segments.
//! Markup segments are copied through untouched. Substitutions run per segment, in a fixed
//! order, and only ever target ASCII originals: text that is already curly is left alone.
//!
//! This is a heuristic, not a grammar of quotation.

use crate::annotated::{AnnotatedText, Segment};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

const LEFT_DOUBLE: &str = "\u{201C}";
const RIGHT_DOUBLE: &str = "\u{201D}";
const LEFT_SINGLE: &str = "\u{2018}";
const RIGHT_SINGLE: &str = "\u{2019}";
const EM_DASH: &str = "\u{2014}";
const EN_DASH: &str = "\u{2013}";
const ELLIPSIS: &str = "\u{2026}";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

/// At the start of the run, or right before a word character or an opened single quote.
static OPENING_DOUBLE: Lazy<Regex> = Lazy::new(|| regex(r#"^"|"([\w'\u{2018}])"#));
static CLOSING_DOUBLE: Lazy<Regex> = Lazy::new(|| regex(r#"([\w.!?%,'\u{2019}])""#));
/// Same as the double quote, except that a quote inside a word is an apostrophe.
static OPENING_SINGLE: Lazy<Regex> = Lazy::new(|| regex(r#"^'|(^|\W)'([\w\u{201C}])"#));
static CLOSING_SINGLE: Lazy<Regex> = Lazy::new(|| regex(r#"([\w.!?%,\u{201D}])'"#));
static TRIPLE_HYPHEN: Lazy<Regex> = Lazy::new(|| regex(r"(\w)---(\w)"));
static DOUBLE_HYPHEN: Lazy<Regex> = Lazy::new(|| regex(r"(\w)--(\w)"));
static TRIPLE_DOT: Lazy<Regex> = Lazy::new(|| regex(r"\.\.\."));

/// Smart-format an annotated document, returning the full rewritten source.
pub fn smart_format(annotated: &AnnotatedText) -> String {
    annotated
        .segments()
        .iter()
        .map(|segment| match segment {
            Segment::Text { text } => smart_format_text(text),
            Segment::Markup { markup, .. } => markup.clone(),
        })
        .collect()
}

/// Apply every substitution to one prose run.
pub fn smart_format_text(text: &str) -> String {
    let text = OPENING_DOUBLE.replace_all(text, format!("{LEFT_DOUBLE}${{1}}").as_str());
    let text = replace_repeatedly(&CLOSING_DOUBLE, &text, &format!("${{1}}{RIGHT_DOUBLE}"));
    let text = text.replacen('"', RIGHT_DOUBLE, 1);

    let text = replace_repeatedly(&OPENING_SINGLE, &text, &format!("${{1}}{LEFT_SINGLE}${{2}}"));
    let text = replace_repeatedly(&CLOSING_SINGLE, &text, &format!("${{1}}{RIGHT_SINGLE}"));
    let text = text.replacen('\'', RIGHT_SINGLE, 1);

    let text = replace_repeatedly(&TRIPLE_HYPHEN, &text, &format!("${{1}}{EM_DASH}${{2}}"));
    let text = replace_repeatedly(&DOUBLE_HYPHEN, &text, &format!("${{1}}{EN_DASH}${{2}}"));

    TRIPLE_DOT.replace_all(&text, ELLIPSIS).into_owned()
}

/// `replace_all` until nothing matches. Patterns that consume the word character on either
/// side of a match skip neighbours like the second dash in `a--b--c` on a single pass.
fn replace_repeatedly(pattern: &Regex, text: &str, replacement: &str) -> String {
    let mut current = text.to_string();
    loop {
        match pattern.replace_all(&current, replacement) {
            Cow::Borrowed(_) => return current,
            Cow::Owned(next) => current = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curls_double_quotes() {
        assert_eq!(
            smart_format_text(r#"He said "hello" to me."#),
            "He said \u{201C}hello\u{201D} to me."
        );
        assert_eq!(smart_format_text(r#""Quoted.""#), "\u{201C}Quoted.\u{201D}");
    }

    #[test]
    fn curls_apostrophes_and_single_quotes() {
        assert_eq!(smart_format_text("don't"), "don\u{2019}t");
        assert_eq!(smart_format_text("'tis 'fine'"), "\u{2018}tis \u{2018}fine\u{2019}");
    }

    #[test]
    fn nested_quotes() {
        assert_eq!(
            smart_format_text(r#""'Hi,' she said""#),
            "\u{201C}\u{2018}Hi,\u{2019} she said\u{201D}"
        );
    }

    #[test]
    fn opening_double_at_start_or_before_a_word() {
        assert_eq!(smart_format_text("\" hello\""), "\u{201C} hello\u{201D}");
        assert_eq!(smart_format_text("a\"b\" c"), "a\u{201C}b\u{201D} c");
    }

    #[test]
    fn unmatched_quote_fallback_is_first_only() {
        assert_eq!(smart_format_text(r#"a " b " c"#), "a \u{201D} b \" c");
    }

    #[test]
    fn dashes_between_words() {
        assert_eq!(smart_format_text("a---b"), "a\u{2014}b");
        assert_eq!(smart_format_text("a--b--c"), "a\u{2013}b\u{2013}c");
        assert_eq!(smart_format_text("-- not between words --"), "-- not between words --");
    }

    #[test]
    fn ellipsis() {
        assert_eq!(smart_format_text("Wait..."), "Wait\u{2026}");
    }

    #[test]
    fn markup_is_untouched() {
        let annotated = AnnotatedText::from_segments(vec![
            Segment::text("Say \"hi\" "),
            Segment::markup("<a title=\"x--y\">"),
            Segment::text("now..."),
        ]);
        assert_eq!(
            smart_format(&annotated),
            "Say \u{201C}hi\u{201D} <a title=\"x--y\">now\u{2026}"
        );
    }
}
