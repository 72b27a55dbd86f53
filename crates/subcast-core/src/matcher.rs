//! Key classification
//!
//! A [`KeyMatcher`] wraps the compiled pattern of one category and decides
//! whether an arbitrary inbound string belongs to that category. Matching is
//! case-insensitive and locale-independent; the pattern is compiled once at
//! category construction and never rebuilt.

use regex::RegexBuilder;

use crate::error::{Error, Result};

/// Classifies candidate keys against one category pattern
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    pattern: regex::Regex,
}

impl KeyMatcher {
    /// Compile a matcher from a regular expression
    pub fn new(pattern: &str) -> Result<Self> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::pattern(pattern, e))?;

        Ok(Self { pattern: compiled })
    }

    /// Compile a matcher that matches a literal key (metacharacters escaped)
    pub fn literal(key: &str) -> Result<Self> {
        Self::new(&regex::escape(key))
    }

    /// Whether `candidate` belongs to this category
    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern.is_match(candidate)
    }

    /// The pattern text this matcher was built from
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        let matcher = KeyMatcher::new("^ping$").unwrap();
        assert!(matcher.matches("ping"));
        assert!(matcher.matches("PING"));
        assert!(matcher.matches("PiNg"));
        assert!(!matcher.matches("pong"));
        assert!(!matcher.matches("ping "));
    }

    #[test]
    fn unanchored_patterns_match_substrings() {
        let matcher = KeyMatcher::new("sensor-[0-9]+").unwrap();
        assert!(matcher.matches("sensor-12"));
        assert!(matcher.matches("west/sensor-3/temp"));
        assert!(!matcher.matches("sensor-"));
    }

    #[test]
    fn literal_keys_are_escaped() {
        let matcher = KeyMatcher::literal("a.b").unwrap();
        assert!(matcher.matches("a.b"));
        assert!(matcher.matches("A.B"));
        assert!(!matcher.matches("axb"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = KeyMatcher::new("(unclosed").unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }
}
