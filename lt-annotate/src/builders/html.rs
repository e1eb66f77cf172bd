//! HTML annotation
//!
//! Strategy: a single left-to-right scan driven by a table of markup rules. Every `<` is tried
//! against the rules in order; the first match becomes one markup segment, everything else is
//! prose. Character references (`&amp;`) stay in the prose verbatim so offsets are untouched.
//!
//! | Rule        | Matches                                   | Interpretation        |
//! |-------------|-------------------------------------------|-----------------------|
//! | comment     | `<!-- ... -->` (unterminated: to the end)  | newlines              |
//! | cdata       | `<![CDATA[ ... ]]>`                        | newlines              |
//! | declaration | `<!DOCTYPE html>`                          | newlines              |
//! | instruction | `<?xml ... ?>`                             | newlines              |
//! | raw text    | `<script>`, `<style>`, `<pre>`, `<code>` element with its body | newlines |
//! | tag         | any start or end tag                       | block tags: paragraph break |
//! | fragment    | an unclosed `<tag` up to the end of line   | newlines              |

use super::{interpret, AnnotationBuilder};
use crate::annotated::AnnotatedText;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Opaque,
    Tag,
}

struct MarkupRule {
    kind: RuleKind,
    pattern: Regex,
}

impl MarkupRule {
    fn new(kind: RuleKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("valid regex"),
        }
    }
}

static RULES: Lazy<Vec<MarkupRule>> = Lazy::new(|| {
    vec![
        MarkupRule::new(RuleKind::Opaque, r"\A<!--(?s:.*?)(?:-->|\z)"),
        MarkupRule::new(RuleKind::Opaque, r"\A<!\[CDATA\[(?s:.*?)(?:\]\]>|\z)"),
        MarkupRule::new(RuleKind::Opaque, r"\A<![A-Za-z][^>]*>"),
        MarkupRule::new(RuleKind::Opaque, r"\A<\?[^>]*>"),
        MarkupRule::new(
            RuleKind::Opaque,
            r"(?i)\A<script\b[^>]*>(?s:.*?)(?:</script\s*>|\z)",
        ),
        MarkupRule::new(
            RuleKind::Opaque,
            r"(?i)\A<style\b[^>]*>(?s:.*?)(?:</style\s*>|\z)",
        ),
        MarkupRule::new(RuleKind::Opaque, r"(?i)\A<pre\b[^>]*>(?s:.*?)(?:</pre\s*>|\z)"),
        MarkupRule::new(
            RuleKind::Opaque,
            r"(?i)\A<code\b[^>]*>(?s:.*?)(?:</code\s*>|\z)",
        ),
        MarkupRule::new(
            RuleKind::Tag,
            r#"\A</?[A-Za-z][A-Za-z0-9:-]*(?:"[^"]*"|'[^']*'|[^'"<>])*>"#,
        ),
        MarkupRule::new(RuleKind::Opaque, r"\A</?[A-Za-z][^\n>]*"),
    ]
});

static TAG_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A</?([A-Za-z][A-Za-z0-9:-]*)").expect("valid regex"));

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "br", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "li", "main", "nav", "ol", "p", "section", "summary",
    "table", "td", "th", "title", "tr", "ul",
];

fn is_block_tag(markup: &str) -> bool {
    TAG_NAME
        .captures(markup)
        .and_then(|captures| captures.get(1))
        .map(|name| {
            let name = name.as_str().to_ascii_lowercase();
            BLOCK_TAGS.contains(&name.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlBuilder;

impl AnnotationBuilder for HtmlBuilder {
    fn name(&self) -> &str {
        "html"
    }

    fn build(&self, source: &str) -> AnnotatedText {
        let mut annotated = AnnotatedText::new();
        let mut text_start = 0;
        let mut pos = 0;

        while let Some(found) = source[pos..].find('<') {
            let at = pos + found;
            match match_rule(&source[at..]) {
                Some((kind, len)) => {
                    annotated.push_text(&source[text_start..at]);
                    let markup = &source[at..at + len];
                    let block = kind == RuleKind::Tag && is_block_tag(markup);
                    annotated.push_markup(markup, interpret::html(markup, block));
                    pos = at + len;
                    text_start = pos;
                }
                None => pos = at + 1,
            }
        }
        annotated.push_text(&source[text_start..]);
        annotated
    }
}

fn match_rule(rest: &str) -> Option<(RuleKind, usize)> {
    RULES.iter().find_map(|rule| {
        rule.pattern
            .find(rest)
            .filter(|m| m.end() > 0)
            .map(|m| (rule.kind, m.end()))
    })
}
