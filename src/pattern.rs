//! Regex pattern lists that persist as plain strings.
//!
//! A [`PatternSet`] keeps the source strings alongside the compiled matchers.
//! Only the strings are ever serialized; deserializing recompiles them, and a
//! string that no longer compiles fails the whole deserialization.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Ordered list of regular expressions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct PatternSet {
    /// Pattern strings in declaration order
    sources: Vec<String>,
    /// `sources[i]` compiled, same order
    compiled: Vec<Regex>,
}

impl PatternSet {
    /// Compile every pattern, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error encountered.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = sources
            .iter()
            .map(|s| Regex::new(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sources, compiled })
    }

    /// Pattern strings in declaration order.
    #[must_use]
    pub fn as_strings(&self) -> &[String] {
        &self.sources
    }

    /// True if no patterns were given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True if any pattern finds a match anywhere in `haystack`.
    #[must_use]
    pub fn matches_any(&self, haystack: &str) -> bool {
        self.compiled.iter().any(|re| re.is_match(haystack))
    }

    /// True if every pattern finds a match somewhere in `haystack`.
    ///
    /// Vacuously true for an empty set.
    #[must_use]
    pub fn matches_all(&self, haystack: &str) -> bool {
        self.compiled.iter().all(|re| re.is_match(haystack))
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}

impl Eq for PatternSet {}

impl TryFrom<Vec<String>> for PatternSet {
    type Error = regex::Error;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PatternSet> for Vec<String> {
    fn from(value: PatternSet) -> Self {
        value.sources
    }
}
