use crate::pattern::PatternSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Routes files whose text matches every pattern to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Regexes searched for in the extracted text; all must match
    pub patterns: PatternSet,
    /// Destination directory
    pub to: PathBuf,
}

impl Rule {
    /// Build a rule, compiling its patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is not a valid regular expression.
    pub fn new<I, S>(patterns: I, to: impl Into<PathBuf>) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            patterns: PatternSet::new(patterns)?,
            to: to.into(),
        })
    }

    /// True if every pattern is found somewhere in `text`.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.patterns.matches_all(text)
    }
}

/// Destination of the first rule, in declaration order, matching `text`.
#[must_use]
pub fn first_match<'a>(rules: &'a [Rule], text: &str) -> Option<&'a Path> {
    rules
        .iter()
        .find(|rule| rule.matches(text))
        .map(|rule| rule.to.as_path())
}
