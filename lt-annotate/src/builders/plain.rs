use super::AnnotationBuilder;
use crate::annotated::AnnotatedText;

/// Plain text is prose end to end.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextBuilder;

impl AnnotationBuilder for PlainTextBuilder {
    fn name(&self) -> &str {
        "plaintext"
    }

    fn build(&self, source: &str) -> AnnotatedText {
        let mut annotated = AnnotatedText::new();
        annotated.push_text(source);
        annotated
    }
}
