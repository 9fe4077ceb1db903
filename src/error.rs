//! Error types shared by every docfill operation.

use std::fmt;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocfillError>;

/// One offending entry of a rejected batch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Violation {
    /// Position of the entry in the caller's batch.
    pub index: usize,
    /// Identifier of the entry, or `<missing>` when none was supplied.
    pub identifier: String,
    pub message: String,
}

impl Violation {
    pub(crate) fn new(index: usize, identifier: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            index,
            identifier: identifier
                .filter(|id| !id.trim().is_empty())
                .unwrap_or("<missing>")
                .to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "entry '{}' (index {}): {}",
            self.identifier, self.index, self.message
        )
    }
}

fn render_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors produced while indexing, writing or verifying a document.
#[derive(Debug, Error)]
pub enum DocfillError {
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    #[error("unsupported document format: {reason}")]
    UnsupportedFormat { reason: String },

    #[error("document is {size} bytes, above the {limit} byte limit")]
    DocumentTooLarge { size: u64, limit: u64 },

    #[error(
        "answer validation failed ({} invalid answer(s)):\n{}",
        violations.len(),
        render_violations(violations)
    )]
    InvalidAnswers { violations: Vec<Violation> },

    #[error(
        "expectation validation failed ({} invalid expectation(s)):\n{}",
        violations.len(),
        render_violations(violations)
    )]
    InvalidExpectations { violations: Vec<Violation> },

    #[error(
        "prebuilt fragment check failed ({} invalid fragment(s)):\n{}",
        violations.len(),
        render_violations(violations)
    )]
    InvalidFragment { violations: Vec<Violation> },

    #[error(
        "identifier '{identifier}' (index {index}) could not be resolved in the current document; \
         re-extract to get current identifiers"
    )]
    UnresolvedIdentifier { index: usize, identifier: String },

    #[error("locator '{locator}' for identifier '{identifier}' did not match any element in the document")]
    TargetNotFound { identifier: String, locator: String },

    #[error("no placeholder {marker} found in the text at '{identifier}'")]
    PlaceholderNotFound { identifier: String, marker: String },

    #[error("locator '{locator}' is not valid for this document kind: {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    #[error("xml error: {reason}")]
    Xml { reason: String },

    #[error("zip package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocfillError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }

    /// Violations carried by an aggregated batch error, empty for other variants.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::InvalidAnswers { violations }
            | Self::InvalidExpectations { violations }
            | Self::InvalidFragment { violations } => violations,
            _ => &[],
        }
    }
}

impl From<quick_xml::Error> for DocfillError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml {
            reason: err.to_string(),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for DocfillError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml {
            reason: err.to_string(),
        }
    }
}
