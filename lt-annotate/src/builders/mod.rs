//! Annotation builders
//!
//! Each dialect family implements [`AnnotationBuilder`]. Builders are infallible: malformed
//! input degrades into markup, and the concatenated segments always reproduce the input.

pub mod html;
pub mod interpret;
pub mod markdown;
pub mod plain;

use crate::annotated::{AnnotatedText, Segment};
use crate::dialect::{Dialect, RefinementRule};

pub use html::HtmlBuilder;
pub use markdown::MarkdownBuilder;
pub use plain::PlainTextBuilder;

/// Trait for dialect specific annotation builders
pub trait AnnotationBuilder: Send + Sync {
    /// The name of the dialect family (e.g. "markdown")
    fn name(&self) -> &str;

    /// Split `source` into prose and markup segments.
    fn build(&self, source: &str) -> AnnotatedText;
}

static PLAIN_TEXT: PlainTextBuilder = PlainTextBuilder;
static MARKDOWN: MarkdownBuilder = MarkdownBuilder;
static HTML: HtmlBuilder = HtmlBuilder;

impl Dialect {
    pub fn builder(&self) -> &'static dyn AnnotationBuilder {
        match self {
            Dialect::PlainText => &PLAIN_TEXT,
            Dialect::Markdown | Dialect::Mdx => &MARKDOWN,
            Dialect::Html => &HTML,
        }
    }
}

/// Build the annotated text for `source` in the given dialect.
pub fn build(source: &str, dialect: Dialect) -> AnnotatedText {
    let annotated = dialect.builder().build(source);
    refine(annotated, dialect.refinement_rules())
}

/// Reclassify rule matches inside prose segments as markup.
fn refine(annotated: AnnotatedText, rules: &[RefinementRule]) -> AnnotatedText {
    if rules.is_empty() {
        return annotated;
    }
    let mut refined = AnnotatedText::new();
    for segment in annotated.into_segments() {
        match segment {
            Segment::Text { text } => split_prose(&text, rules, &mut refined),
            markup => refined.push(markup),
        }
    }
    refined
}

fn split_prose(text: &str, rules: &[RefinementRule], out: &mut AnnotatedText) {
    let mut spans: Vec<(usize, usize)> = rules
        .iter()
        .flat_map(|rule| rule.pattern.find_iter(text).map(|m| (m.start(), m.end())))
        .collect();
    spans.sort_unstable();

    let mut cursor = 0;
    for (start, end) in spans {
        if start < cursor {
            continue;
        }
        out.push_text(&text[cursor..start]);
        out.push_markup(&text[start..end], None);
        cursor = end;
    }
    out.push_text(&text[cursor..]);
}
