//! Annotated text for grammar checking
//!
//!     This crate turns raw document text into the annotated-text representation accepted by
//!     LanguageTool style services: an ordered list of segments, each either prose (checked) or
//!     markup (skipped, but still occupying offset space).
//!
//! Architecture
//!
//!     - AnnotatedText / Segment: the shared output contract, see [./annotated.rs]
//!     - Dialect: the markup flavor of a document and its data-driven refinement rules
//!     - AnnotationBuilder trait: one implementation per dialect family, selected through
//!       [`Dialect::builder`] so callers have a single entry point, [`build`]
//!     - Smart formatting: typographic rewriting that only ever touches prose segments
//!
//!     This is a pure lib: no I/O, no logging, no async. The language server crate owns all of
//!     that.
//!
//!     The file structure :
//!     .
//!     ├── annotated.rs            # AnnotatedText, Segment, offset helpers
//!     ├── dialect.rs              # Dialect tag + refinement rules
//!     ├── builders
//!     │   ├── mod.rs              # AnnotationBuilder trait, build()
//!     │   ├── interpret.rs        # interpretAs policy for markup runs
//!     │   ├── plain.rs
//!     │   ├── markdown.rs         # comrak backed
//!     │   └── html.rs             # rule table scanner
//!     ├── smart_format.rs
//!     └── lib.rs
//!
//! The Offset Invariant
//!
//!     Every builder partitions its input: concatenating the content of all segments, text and
//!     markup alike, reproduces the input byte for byte. Offsets returned by the service are
//!     therefore offsets into the original document, and mapping them back is a walk over the
//!     segment lengths (see [`AnnotatedText::source_offset`]). Builders never fail; anything they
//!     cannot classify is kept as markup.
//!
//! Testing
//!
//!     tests
//!     ├── markdown.rs
//!     ├── html.rs
//!     ├── offsets.rs              # proptest over the offset invariant
//!     └── smart_format.rs

pub mod annotated;
pub mod builders;
pub mod dialect;
pub mod smart_format;

pub use annotated::{AnnotatedText, Segment};
pub use builders::{build, AnnotationBuilder};
pub use dialect::Dialect;
pub use smart_format::{smart_format, smart_format_text};
