//! Placeholder recognition in template text.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::DEFAULT_PLACEHOLDER_PATTERNS;
use crate::types::FillOptions;
use crate::{DocfillError, Result};

static DEFAULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_PLACEHOLDER_PATTERNS
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
});

/// A set of placeholder patterns.
#[derive(Debug, Clone)]
pub struct PlaceholderPatterns {
    patterns: Vec<Regex>,
}

impl Default for PlaceholderPatterns {
    fn default() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }
}

impl PlaceholderPatterns {
    /// Compile caller-configured patterns.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern.as_ref()).map_err(|err| DocfillError::InvalidOptions {
                    reason: format!("placeholder pattern '{}': {err}", pattern.as_ref()),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Patterns configured in `options`, reusing the compiled defaults.
    pub fn from_options(options: &FillOptions) -> Result<Self> {
        if options.uses_default_placeholders() {
            Ok(Self::default())
        } else {
            Self::compile(&options.placeholder_patterns)
        }
    }

    /// True when `text` contains any placeholder.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(text))
    }

    /// Leftmost placeholder in `text` across all patterns.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        self.patterns
            .iter()
            .filter_map(|re| re.find(text).map(|m| m.range()))
            .min_by_key(|range| (range.start, std::cmp::Reverse(range.end)))
    }

    /// Human-readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        self.patterns
            .iter()
            .map(|re| format!("/{}/", re.as_str()))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// What `replace_placeholder` looks for in the target text.
#[derive(Debug, Clone, Copy)]
pub enum PlaceholderMatcher<'a> {
    /// A literal marker supplied with the answer.
    Literal(&'a str),
    /// The configured patterns.
    Patterns(&'a PlaceholderPatterns),
}

impl PlaceholderMatcher<'_> {
    #[must_use]
    pub fn find(&self, text: &str) -> Option<Range<usize>> {
        match self {
            Self::Literal(marker) if marker.is_empty() => None,
            Self::Literal(marker) => text.find(marker).map(|start| start..start + marker.len()),
            Self::Patterns(patterns) => patterns.find(text),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(marker) => format!("'{marker}'"),
            Self::Patterns(patterns) => patterns.describe(),
        }
    }

    /// Substitute the first match in `text`, if any.
    #[must_use]
    pub fn replace_first(&self, text: &str, replacement: &str) -> Option<String> {
        let range = self.find(text)?;
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..range.start]);
        out.push_str(replacement);
        out.push_str(&text[range.end..]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_cover_brackets_and_underscores() {
        let patterns = PlaceholderPatterns::default();
        assert!(patterns.is_match("Name: [Enter name]"));
        assert!(patterns.is_match("Signed ____"));
        assert!(!patterns.is_match("Signed __"));
        assert_eq!(patterns.find("a ___ [Enter x]"), Some(2..5));
    }

    #[test]
    fn literal_replacement_touches_first_occurrence_only() {
        let matcher = PlaceholderMatcher::Literal("{{x}}");
        assert_eq!(
            matcher.replace_first("{{x}} and {{x}}", "1").as_deref(),
            Some("1 and {{x}}")
        );
        assert_eq!(matcher.replace_first("nothing", "1"), None);
    }

    #[test]
    fn invalid_patterns_are_reported() {
        assert!(PlaceholderPatterns::compile(&["("]).is_err());
    }
}
