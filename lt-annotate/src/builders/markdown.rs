//! Markdown (and MDX) annotation
//!
//! Pipeline: Markdown string → Comrak AST → prose spans located in the source → segments.
//!
//! Only `Text` nodes and inline code spans are extracted from the tree; every byte between
//! them is markup. Each text literal is located in the source through the node's sourcepos and
//! verified against the source slice. Backslash escapes and character references (`&amp;`,
//! `&#8212;`) are aligned character by character: a backslash becomes plain markup, a reference
//! becomes markup interpreted as its decoded text. Any other difference between comrak's
//! literal and the source (replaced NULs) leaves the span as markup.

use super::{interpret, AnnotationBuilder};
use crate::annotated::AnnotatedText;
use comrak::nodes::{AstNode, NodeValue, Sourcepos};
use comrak::{parse_document, Arena, Options};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static CHARACTER_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A&(?:#[0-9]{1,7}|#[xX][0-9A-Fa-f]{1,6}|[A-Za-z][A-Za-z0-9]{1,31});")
        .expect("valid regex")
});

/// A located piece of a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TextSpan {
    Prose(Range<usize>),
    /// A character reference and the text it decodes to.
    Reference { range: Range<usize>, decoded: String },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownBuilder;

impl AnnotationBuilder for MarkdownBuilder {
    fn name(&self) -> &str {
        "markdown"
    }

    fn build(&self, source: &str) -> AnnotatedText {
        let arena = Arena::new();
        let options = default_comrak_options();
        let root = parse_document(&arena, source, &options);

        let mut collector = Collector::new(source);
        for node in root.descendants() {
            collector.visit(node);
        }
        collector.finish()
    }
}

fn default_comrak_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.front_matter_delimiter = Some("---".to_string());
    options
}

struct Collector<'s> {
    source: &'s str,
    line_starts: Vec<usize>,
    cursor: usize,
    out: AnnotatedText,
}

impl<'s> Collector<'s> {
    fn new(source: &'s str) -> Self {
        let mut line_starts = vec![0];
        for (idx, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(idx + 1);
            }
        }
        Self {
            source,
            line_starts,
            cursor: 0,
            out: AnnotatedText::new(),
        }
    }

    fn visit<'a>(&mut self, node: &'a AstNode<'a>) {
        let data = node.data.borrow();
        match &data.value {
            NodeValue::Text(literal) => {
                for span in self.locate_text(data.sourcepos, literal) {
                    match span {
                        TextSpan::Prose(range) => {
                            self.markup_until(range.start);
                            self.out.push_text(&self.source[range.clone()]);
                            self.cursor = range.end;
                        }
                        TextSpan::Reference { range, decoded } => {
                            self.markup_until(range.start);
                            self.out
                                .push_markup(&self.source[range.clone()], Some(decoded));
                            self.cursor = range.end;
                        }
                    }
                }
            }
            NodeValue::Code(_) => {
                if let Some(span) = self.locate_code(data.sourcepos) {
                    self.markup_until(span.start);
                    let markup = &self.source[span.clone()];
                    let redacted = interpret::inline_code(markup);
                    self.out.push_markup(markup, redacted);
                    self.cursor = span.end;
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> AnnotatedText {
        self.markup_until(self.source.len());
        self.out
    }

    fn markup_until(&mut self, end: usize) {
        if end <= self.cursor {
            return;
        }
        let markup = &self.source[self.cursor..end];
        self.out.push_markup(markup, interpret::markdown(markup));
        self.cursor = end;
    }

    /// Source spans holding `literal`. Usually one prose span; backslash escapes and character
    /// references split it.
    fn locate_text(&self, sourcepos: Sourcepos, literal: &str) -> Vec<TextSpan> {
        if literal.is_empty() {
            return Vec::new();
        }
        if let Some(span) = self.byte_range(sourcepos) {
            if self.source.get(span.clone()) == Some(literal) {
                return vec![TextSpan::Prose(span)];
            }
            if let Some(spans) = self.align(span.start, literal) {
                return spans;
            }
        }
        // Sourcepos can drift for merged or post-processed text nodes; fall back to the next
        // verbatim occurrence on the node's own lines.
        let limit = self.line_end(sourcepos.end.line).unwrap_or(self.source.len());
        self.source
            .get(self.cursor..limit.max(self.cursor))
            .and_then(|window| window.find(literal))
            .map(|idx| vec![TextSpan::Prose(self.cursor + idx..self.cursor + idx + literal.len())])
            .unwrap_or_default()
    }

    /// Walk the source from `start` alongside `literal`, splitting out escapes and references.
    fn align(&self, start: usize, literal: &str) -> Option<Vec<TextSpan>> {
        let mut spans = Vec::new();
        let mut run_start: Option<usize> = None;
        let mut pos = start;
        let mut consumed = 0;

        while consumed < literal.len() {
            let rest = self.source.get(pos..)?;
            let remaining = &literal[consumed..];

            if let Some((len, decoded)) = character_reference(rest) {
                // `\&amp;` keeps the reference verbatim in the literal.
                if !remaining.starts_with(&rest[..len]) && remaining.starts_with(decoded.as_str())
                {
                    if let Some(run) = run_start.take() {
                        spans.push(TextSpan::Prose(run..pos));
                    }
                    consumed += decoded.len();
                    spans.push(TextSpan::Reference {
                        range: pos..pos + len,
                        decoded,
                    });
                    pos += len;
                    continue;
                }
            }

            let ch = rest.chars().next()?;
            let expected = remaining.chars().next()?;
            if ch == expected {
                run_start.get_or_insert(pos);
                pos += ch.len_utf8();
                consumed += ch.len_utf8();
                continue;
            }
            let escaped =
                ch == '\\' && expected.is_ascii_punctuation() && rest[1..].starts_with(expected);
            if !escaped {
                return None;
            }
            if let Some(run) = run_start.take() {
                spans.push(TextSpan::Prose(run..pos));
            }
            pos += 1;
        }

        if let Some(run) = run_start {
            spans.push(TextSpan::Prose(run..pos));
        }
        Some(spans)
    }

    fn locate_code(&self, sourcepos: Sourcepos) -> Option<Range<usize>> {
        let span = self.byte_range(sourcepos)?;
        let markup = self.source.get(span.clone())?;
        if markup.len() >= 2 && markup.starts_with('`') && markup.ends_with('`') {
            Some(span)
        } else {
            None
        }
    }

    /// Sourcepos is 1-based with an inclusive end column, both counted in bytes.
    fn byte_range(&self, sourcepos: Sourcepos) -> Option<Range<usize>> {
        let (start, end) = (sourcepos.start, sourcepos.end);
        if start.line == 0 || start.column == 0 || end.line == 0 {
            return None;
        }
        let start = self.line_starts.get(start.line - 1)? + start.column - 1;
        let end = self.line_starts.get(end.line - 1)? + end.column;
        if start < self.cursor || end <= start || end > self.source.len() {
            return None;
        }
        Some(start..end)
    }

    fn line_end(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return None;
        }
        Some(self.line_starts.get(line).copied().unwrap_or(self.source.len()))
    }
}

/// Length and decoded text of the character reference opening `text`, if any.
fn character_reference(text: &str) -> Option<(usize, String)> {
    let found = CHARACTER_REFERENCE.find(text)?;
    let decoded = html_escape::decode_html_entities(found.as_str());
    if decoded == found.as_str() {
        return None;
    }
    Some((found.len(), decoded.into_owned()))
}
