//! Builder-style options shared by every docfill operation.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_ANSWERS, DEFAULT_MAX_DOCUMENT_BYTES, DEFAULT_PLACEHOLDER_PATTERNS,
    DEFAULT_SNIPPET_CHARS,
};

fn default_max_answers() -> usize {
    DEFAULT_MAX_ANSWERS
}

fn default_max_document_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}

fn default_snippet_chars() -> usize {
    DEFAULT_SNIPPET_CHARS
}

fn default_placeholder_patterns() -> Vec<String> {
    DEFAULT_PLACEHOLDER_PATTERNS
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Limits and patterns applied while indexing, writing and verifying.
///
/// Every field has a serde default so hosts can load a partial config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOptions {
    /// Largest batch accepted by write, preview and verify.
    #[serde(default = "default_max_answers")]
    pub max_answers: usize,
    /// Largest input document accepted, in bytes.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
    /// Characters of raw XML shown for complex elements in compact text.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    /// Regexes recognised as placeholders when an answer names no marker.
    #[serde(default = "default_placeholder_patterns")]
    pub placeholder_patterns: Vec<String>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            max_answers: default_max_answers(),
            max_document_bytes: default_max_document_bytes(),
            snippet_chars: default_snippet_chars(),
            placeholder_patterns: default_placeholder_patterns(),
        }
    }
}

impl FillOptions {
    /// Start a fluent builder for `FillOptions`.
    #[must_use]
    pub fn builder() -> FillOptionsBuilder {
        FillOptionsBuilder::default()
    }

    /// Whether the configured placeholder patterns are the built-in ones.
    #[must_use]
    pub fn uses_default_placeholders(&self) -> bool {
        self.placeholder_patterns
            .iter()
            .map(String::as_str)
            .eq(DEFAULT_PLACEHOLDER_PATTERNS.iter().copied())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillOptionsBuilder {
    inner: FillOptions,
}

impl FillOptionsBuilder {
    #[must_use]
    pub fn max_answers(mut self, max: usize) -> Self {
        self.inner.max_answers = max;
        self
    }

    #[must_use]
    pub fn max_document_bytes(mut self, max: u64) -> Self {
        self.inner.max_document_bytes = max;
        self
    }

    #[must_use]
    pub fn snippet_chars(mut self, chars: usize) -> Self {
        self.inner.snippet_chars = chars;
        self
    }

    /// Replace the placeholder patterns.
    pub fn placeholder_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.placeholder_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn push_placeholder_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.inner.placeholder_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn build(self) -> FillOptions {
        self.inner
    }
}
