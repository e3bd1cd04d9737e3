//! Declarative element locators.
//!
//! A `LocatorSet` is an ordered priority list of ways to find one logical
//! element. The frontend renames its generated CSS classes between
//! releases, so robustness lives in the data: adding tolerance for a new
//! markup variant means appending a candidate, not writing a new branch.

use std::fmt;

/// How a pattern string is interpreted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// CSS selector (attribute / class match).
    Css,
    /// XPath expression (structural path, text predicates).
    XPath,
}

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub strategy: Strategy,
    pub pattern: String,
}

impl Locator {
    pub fn css(pattern: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::Css,
            pattern: pattern.into(),
        }
    }

    pub fn xpath(pattern: impl Into<String>) -> Self {
        Self {
            strategy: Strategy::XPath,
            pattern: pattern.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.strategy {
            Strategy::Css => write!(f, "css:{}", self.pattern),
            Strategy::XPath => write!(f, "xpath:{}", self.pattern),
        }
    }
}

/// Ordered candidates for one logical element, tried first to last.
#[derive(Debug, Clone, Default)]
pub struct LocatorSet {
    candidates: Vec<Locator>,
}

impl LocatorSet {
    pub fn new(candidates: Vec<Locator>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Locator] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate descriptions, for diagnostics on exhaustion.
    pub fn descriptions(&self) -> Vec<String> {
        self.candidates.iter().map(|c| c.to_string()).collect()
    }
}

impl From<Vec<Locator>> for LocatorSet {
    fn from(candidates: Vec<Locator>) -> Self {
        Self::new(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_strategy_tag() {
        assert_eq!(Locator::css("div.note").to_string(), "css:div.note");
        assert_eq!(
            Locator::xpath("//span[text()='x']").to_string(),
            "xpath://span[text()='x']"
        );
    }

    #[test]
    fn descriptions_preserve_order() {
        let set = LocatorSet::new(vec![Locator::css("a"), Locator::xpath("//b")]);
        assert_eq!(set.descriptions(), vec!["css:a", "xpath://b"]);
    }
}
