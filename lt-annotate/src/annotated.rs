//! Annotated text data model
//!
//! An [`AnnotatedText`] is an ordered list of [`Segment`]s. Serialized, it is the `data` field
//! of a check request:
//!
//! ```json
//! {"annotation":[{"text":"Hello "},{"markup":"**","interpretAs":""},{"text":"world"}]}
//! ```
//!
//! Offsets reported back by the service count UTF-16 code units over the concatenated content
//! of every segment, markup included.

use serde::Serialize;

/// One run of the annotated stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Segment {
    /// Prose, checked by the service and eligible for smart formatting.
    Text { text: String },
    /// Inert structure. `markup` is the original source slice; `interpret_as` is what the
    /// service reads in its place (newlines, placeholders, redacted code).
    Markup {
        markup: String,
        #[serde(rename = "interpretAs", skip_serializing_if = "Option::is_none")]
        interpret_as: Option<String>,
    },
}

impl Segment {
    pub fn text(content: impl Into<String>) -> Self {
        Segment::Text {
            text: content.into(),
        }
    }

    pub fn markup(content: impl Into<String>) -> Self {
        Segment::Markup {
            markup: content.into(),
            interpret_as: None,
        }
    }

    pub fn markup_as(content: impl Into<String>, interpret_as: impl Into<String>) -> Self {
        Segment::Markup {
            markup: content.into(),
            interpret_as: Some(interpret_as.into()),
        }
    }

    /// The source slice this segment was derived from.
    pub fn content(&self) -> &str {
        match self {
            Segment::Text { text } => text,
            Segment::Markup { markup, .. } => markup,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text { .. })
    }

    pub fn is_markup(&self) -> bool {
        !self.is_text()
    }

    /// Length in the service's offset space.
    pub fn utf16_len(&self) -> usize {
        utf16_len(self.content())
    }
}

/// Ordered sequence of segments sent to the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotatedText {
    annotation: Vec<Segment>,
}

impl AnnotatedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<Segment>) -> Self {
        let mut annotated = Self::new();
        for segment in segments {
            annotated.push(segment);
        }
        annotated
    }

    /// Append a segment. Empty segments are dropped and adjacent text runs are merged.
    pub fn push(&mut self, segment: Segment) {
        if segment.content().is_empty() {
            return;
        }
        if let Segment::Text { text } = &segment {
            if let Some(Segment::Text { text: previous }) = self.annotation.last_mut() {
                previous.push_str(text);
                return;
            }
        }
        self.annotation.push(segment);
    }

    pub fn push_text(&mut self, content: &str) {
        self.push(Segment::text(content));
    }

    pub fn push_markup(&mut self, content: &str, interpret_as: Option<String>) {
        self.push(Segment::Markup {
            markup: content.to_string(),
            interpret_as,
        });
    }

    pub fn segments(&self) -> &[Segment] {
        &self.annotation
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.annotation
    }

    pub fn is_empty(&self) -> bool {
        self.annotation.is_empty()
    }

    /// Concatenation of every segment: the original document text.
    pub fn source_text(&self) -> String {
        self.annotation.iter().map(Segment::content).collect()
    }

    /// Concatenation of the prose segments only.
    pub fn prose(&self) -> String {
        self.annotation
            .iter()
            .filter(|segment| segment.is_text())
            .map(Segment::content)
            .collect()
    }

    /// Total length of the stream in UTF-16 code units.
    pub fn utf16_len(&self) -> usize {
        self.annotation.iter().map(Segment::utf16_len).sum()
    }

    /// Map an offset in the annotated stream (UTF-16 code units) to a byte offset in the
    /// original document. Offsets past the end clamp to the document length.
    pub fn source_offset(&self, annotated_offset: usize) -> usize {
        let mut remaining = annotated_offset;
        let mut bytes = 0;
        for segment in &self.annotation {
            let content = segment.content();
            let units = utf16_len(content);
            if remaining <= units {
                return bytes + utf16_to_byte(content, remaining);
            }
            remaining -= units;
            bytes += content.len();
        }
        bytes
    }

    /// The `data` payload of a check request.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte offset of the UTF-16 code unit `units` within `text`. A unit that falls inside a
/// surrogate pair resolves to the start of that character.
pub fn utf16_to_byte(text: &str, units: usize) -> usize {
    let mut seen = 0;
    for (idx, ch) in text.char_indices() {
        if seen >= units {
            return idx;
        }
        seen += ch.len_utf16();
        if seen > units {
            return idx;
        }
    }
    text.len()
}
