//! Answer records: what callers submit to the writer, verifier and previewer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::is_skip_sentinel;

/// How a fragment is applied to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsertionMode {
    /// Drop the existing content and make the fragment the sole content.
    #[default]
    ReplaceContent,
    /// Insert the fragment after the existing content.
    Append,
    /// Substitute the fragment's text for a placeholder marker.
    ReplacePlaceholder,
}

impl InsertionMode {
    pub const ALL: [Self; 3] = [Self::ReplaceContent, Self::Append, Self::ReplacePlaceholder];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ReplaceContent => "replace_content",
            Self::Append => "append",
            Self::ReplacePlaceholder => "replace_placeholder",
        }
    }

    /// Parse a caller-supplied label, ignoring case and padding.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for InsertionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How sure the caller is about an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[default]
    Known,
    Uncertain,
    Unknown,
}

impl Confidence {
    pub const ALL: [Self; 3] = [Self::Known, Self::Uncertain, Self::Unknown];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Known => "known",
            Self::Uncertain => "uncertain",
            Self::Unknown => "unknown",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(value))
    }
}

/// The content of an answer: plain text or a caller-built native fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AnswerContent {
    /// Text that the writer turns into a fragment inheriting the target's formatting.
    PlainText(String),
    /// A fragment used as-is: run markup for docx, a value for xlsx and pdf.
    Prebuilt(String),
}

impl AnswerContent {
    /// The text or markup carried by either variant.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PlainText(text) | Self::Prebuilt(text) => text,
        }
    }
}

/// A validated answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub content: AnswerContent,
    #[serde(default)]
    pub mode: InsertionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
}

impl Answer {
    /// A plain-text answer using `replace_content`.
    pub fn plain(identifier: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            locator: None,
            content: AnswerContent::PlainText(text.into()),
            mode: InsertionMode::ReplaceContent,
            placeholder: None,
            confidence: None,
        }
    }

    /// A prebuilt-fragment answer. Prebuilt content always carries an explicit mode.
    pub fn prebuilt(
        identifier: impl Into<String>,
        fragment: impl Into<String>,
        mode: InsertionMode,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            locator: None,
            content: AnswerContent::Prebuilt(fragment.into()),
            mode,
            placeholder: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: InsertionMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_placeholder(mut self, marker: impl Into<String>) -> Self {
        self.placeholder = Some(marker.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// True for plain-text answers holding the skip sentinel.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(&self.content, AnswerContent::PlainText(text) if is_skip_sentinel(text))
    }
}

/// An answer as received from a transport, before validation.
///
/// Every field is optional so that one malformed entry does not abort
/// deserialization of the whole batch; [`crate::validate_answers`] reports
/// all problems at once. Unknown keys land in `extra` and become warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnswer {
    #[serde(default, alias = "pair_id")]
    pub identifier: Option<String>,
    #[serde(default, alias = "xpath")]
    pub locator: Option<String>,
    #[serde(default, alias = "answer_text")]
    pub text: Option<String>,
    #[serde(default, alias = "insertion_xml")]
    pub fragment: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawAnswer {
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }
}

impl From<Answer> for RawAnswer {
    fn from(answer: Answer) -> Self {
        let (text, fragment) = match answer.content {
            AnswerContent::PlainText(text) => (Some(text), None),
            AnswerContent::Prebuilt(fragment) => (None, Some(fragment)),
        };
        Self {
            identifier: Some(answer.identifier),
            locator: answer.locator,
            text,
            fragment,
            mode: Some(answer.mode.label().to_string()),
            placeholder: answer.placeholder,
            confidence: answer.confidence.map(|c| c.label().to_string()),
            extra: BTreeMap::new(),
        }
    }
}

/// What the verifier should find at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    pub expected: String,
    #[serde(default)]
    pub confidence: Confidence,
}

impl Expectation {
    pub fn new(identifier: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            locator: None,
            expected: expected.into(),
            confidence: Confidence::Known,
        }
    }

    #[must_use]
    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }
}

impl From<&Answer> for Expectation {
    fn from(answer: &Answer) -> Self {
        Self {
            identifier: answer.identifier.clone(),
            locator: answer.locator.clone(),
            expected: answer.content.as_str().to_string(),
            confidence: answer.confidence.unwrap_or_default(),
        }
    }
}

/// Verification input before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawExpectation {
    #[serde(default, alias = "pair_id")]
    pub identifier: Option<String>,
    #[serde(default, alias = "xpath")]
    pub locator: Option<String>,
    #[serde(default, alias = "expected_text")]
    pub expected: Option<String>,
    #[serde(default)]
    pub confidence: Option<String>,
}
