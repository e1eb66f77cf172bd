use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Case-insensitive set of words the user never wants flagged.
///
/// Words are stored lowercased; persisted lists are written back sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<String>")]
pub struct IgnoredWordSet {
    words: BTreeSet<String>,
}

impl IgnoredWordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the word was already present.
    pub fn add(&mut self, word: &str) -> bool {
        let word = normalize(word);
        !word.is_empty() && self.words.insert(word)
    }

    pub fn remove(&mut self, word: &str) -> bool {
        self.words.remove(&normalize(word))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&normalize(word))
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn to_sorted_vec(&self) -> Vec<String> {
        self.words.iter().cloned().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for IgnoredWordSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = IgnoredWordSet::new();
        for word in iter {
            set.add(word.as_ref());
        }
        set
    }
}

impl From<IgnoredWordSet> for Vec<String> {
    fn from(set: IgnoredWordSet) -> Self {
        set.words.into_iter().collect()
    }
}

impl<'de> Deserialize<'de> for IgnoredWordSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let words = Vec::<String>::deserialize(deserializer)?;
        Ok(words.into_iter().collect())
    }
}

/// Union view over the global and workspace lists.
#[derive(Debug, Clone, Copy)]
pub struct IgnoredWords<'a> {
    pub global: &'a IgnoredWordSet,
    pub workspace: &'a IgnoredWordSet,
}

impl IgnoredWords<'_> {
    pub fn contains(&self, word: &str) -> bool {
        self.global.contains(word) || self.workspace.contains(word)
    }
}

fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}
