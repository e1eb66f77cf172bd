//! Inline ignore directives
//!
//!     `@IGNORE:RULE_ID@` silences a rule, `@IGNORE:RULE_ID(exact text)@` silences it for one
//!     literal match only. An `LT-` prefix is accepted as well. Directives are scanned over the
//!     raw document, so line numbers are document lines.
//!
//!     A directive covers its own line and the line after it: a match on line `n` is ignored by
//!     directives on line `n` or `n - 1`.

use super::line_index::LineIndex;
use once_cell::sync::Lazy;
use regex::Regex;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(?:LT-)?IGNORE:(?P<id>[_A-Z0-9]+)(?:\((?P<word>[^)]+)\))?@")
        .expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreItem {
    pub line: usize,
    pub rule_id: String,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    items: Vec<IgnoreItem>,
}

impl IgnoreList {
    pub fn build(text: &str) -> Self {
        let index = LineIndex::new(text);
        let items = DIRECTIVE
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                Some(IgnoreItem {
                    line: index.line_of(whole.start()),
                    rule_id: captures.name("id")?.as_str().to_string(),
                    text: captures.name("word").map(|word| word.as_str().to_string()),
                })
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[IgnoreItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_ignored(&self, line: usize, rule_id: &str, match_text: &str) -> bool {
        self.items.iter().any(|item| {
            (item.line == line || item.line + 1 == line)
                && item.rule_id == rule_id
                && item.text.as_deref().map_or(true, |text| text == match_text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_its_line_and_the_next() {
        let list = IgnoreList::build("foo @IGNORE:TEST_RULE@\nbar");
        assert!(list.is_ignored(0, "TEST_RULE", ""));
        assert!(list.is_ignored(0, "TEST_RULE", "anything"));
        assert!(list.is_ignored(1, "TEST_RULE", "bar"));
        assert!(!list.is_ignored(2, "TEST_RULE", "bar"));
    }

    #[test]
    fn directive_does_not_reach_backwards() {
        let list = IgnoreList::build("first\nsecond @IGNORE:TEST_RULE@");
        assert!(!list.is_ignored(0, "TEST_RULE", "first"));
        assert!(list.is_ignored(1, "TEST_RULE", "second"));
    }

    #[test]
    fn word_scoped_directive_is_case_sensitive() {
        let list = IgnoreList::build("A teh cat. @LT-IGNORE:EN_TYPO(teh)@");
        assert_eq!(
            list.items(),
            &[IgnoreItem {
                line: 0,
                rule_id: "EN_TYPO".into(),
                text: Some("teh".into()),
            }]
        );
        assert!(list.is_ignored(0, "EN_TYPO", "teh"));
        assert!(!list.is_ignored(0, "EN_TYPO", "Teh"));
        assert!(!list.is_ignored(0, "OTHER_RULE", "teh"));
    }

    #[test]
    fn lowercase_rule_ids_are_not_directives() {
        assert!(IgnoreList::build("@IGNORE:test_rule@").is_empty());
        assert!(IgnoreList::build("@IGNORE:TEST_RULE").is_empty());
    }

    #[test]
    fn multiple_directives_on_separate_lines() {
        let list = IgnoreList::build("a\n@IGNORE:ONE@\nb\n\n@IGNORE:TWO@ c");
        assert_eq!(list.items().len(), 2);
        assert_eq!(list.items()[0].line, 1);
        assert_eq!(list.items()[1].line, 4);
        assert!(list.is_ignored(2, "ONE", "b"));
        assert!(!list.is_ignored(3, "ONE", ""));
        assert!(list.is_ignored(4, "TWO", "c"));
    }
}
