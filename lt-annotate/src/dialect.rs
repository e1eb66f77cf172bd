//! Document dialects
//!
//! A [`Dialect`] selects the annotation builder and carries a small table of refinement rules:
//! regular expressions that carve markup out of prose segments after the builder ran. The
//! table is data, not code, so dialects that differ only in a few syntactic extras (Markdown vs
//! MDX) share one builder.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// ESM statements at the start of an MDX line.
static MDX_ESM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:import|export)\s[^\n]*").expect("valid regex"));

/// Single-line JSX expressions, e.g. `{props.title}`.
static MDX_EXPRESSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^{}\n]*\}").expect("valid regex"));

/// A regular expression whose matches inside prose are reclassified as markup.
pub struct RefinementRule {
    pub name: &'static str,
    pub pattern: &'static Lazy<Regex>,
}

static MDX_RULES: [RefinementRule; 2] = [
    RefinementRule {
        name: "mdx-esm",
        pattern: &MDX_ESM,
    },
    RefinementRule {
        name: "mdx-expression",
        pattern: &MDX_EXPRESSION,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    PlainText,
    Markdown,
    Mdx,
    Html,
}

impl Dialect {
    /// Map an LSP language identifier to a built-in dialect.
    pub fn from_language_id(language_id: &str) -> Option<Self> {
        match language_id {
            "plaintext" => Some(Dialect::PlainText),
            "markdown" => Some(Dialect::Markdown),
            "mdx" => Some(Dialect::Mdx),
            "html" => Some(Dialect::Html),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::PlainText => "plaintext",
            Dialect::Markdown => "markdown",
            Dialect::Mdx => "mdx",
            Dialect::Html => "html",
        }
    }

    pub fn refinement_rules(&self) -> &'static [RefinementRule] {
        match self {
            Dialect::Mdx => &MDX_RULES,
            _ => &[],
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
