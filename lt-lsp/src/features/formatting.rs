use super::line_index::LineIndex;
use lt_annotate::{build, smart_format, Dialect};
use similar::{Algorithm, DiffTag, TextDiff};
use tower_lsp::lsp_types::TextEdit;

/// Text edit expressed as byte offsets over the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEditSpan {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// Half-open line range used to restrict edits to the lines around the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line + 1,
        }
    }
}

/// Smart-format the prose of the whole document.
pub fn format_document(source: &str, dialect: Dialect) -> Vec<TextEditSpan> {
    let formatted = smart_format(&build(source, dialect));
    compute_edits(source, &formatted)
}

/// Smart-format edits that start inside `range`.
pub fn format_lines(source: &str, dialect: Dialect, range: LineRange) -> Vec<TextEditSpan> {
    let index = LineIndex::new(source);
    format_document(source, dialect)
        .into_iter()
        .filter(|edit| {
            let line = index.line_of(edit.start);
            line >= range.start && line < range.end
        })
        .collect()
}

pub fn to_text_edits(source: &str, spans: &[TextEditSpan]) -> Vec<TextEdit> {
    let index = LineIndex::new(source);
    spans
        .iter()
        .map(|span| TextEdit {
            range: index.range(span.start, span.end),
            new_text: span.new_text.clone(),
        })
        .collect()
}

/// Line-granular edits turning `original` into `formatted`.
fn compute_edits(original: &str, formatted: &str) -> Vec<TextEditSpan> {
    if original == formatted {
        return Vec::new();
    }

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, formatted);
    let old_lines = diff.old_slices();
    let new_lines = diff.new_slices();

    let mut line_offsets = Vec::with_capacity(old_lines.len() + 1);
    let mut offset = 0;
    for line in old_lines {
        line_offsets.push(offset);
        offset += line.len();
    }
    line_offsets.push(offset);

    let mut edits = Vec::new();
    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {}
            // Rewrites keep the line count, so a replaced block pairs up line by line.
            DiffTag::Replace if old_range.len() == new_range.len() => {
                for (old, new) in old_range.zip(new_range) {
                    if old_lines[old] != new_lines[new] {
                        edits.push(TextEditSpan {
                            start: line_offsets[old],
                            end: line_offsets[old + 1],
                            new_text: new_lines[new].to_string(),
                        });
                    }
                }
            }
            _ => edits.push(TextEditSpan {
                start: line_offsets[old_range.start],
                end: line_offsets[old_range.end],
                new_text: new_lines[new_range].concat(),
            }),
        }
    }
    edits
}
