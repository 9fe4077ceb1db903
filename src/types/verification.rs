//! Verification and write result records.

use serde::{Deserialize, Serialize};

use super::answer::{Confidence, Expectation, InsertionMode};

/// Outcome of one expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Matched,
    Mismatched,
    Missing,
}

/// How the location of an expectation was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedFrom {
    /// Looked up from the identifier through a fresh index.
    Identifier,
    /// Taken from the caller-supplied locator.
    Locator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResult {
    pub identifier: String,
    pub locator: String,
    pub expected: String,
    pub actual: String,
    pub status: ContentStatus,
    pub resolved_from: ResolvedFrom,
}

/// Aggregate counts for a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub missing: usize,
    pub structural_issues: usize,
    pub confidence_known: usize,
    pub confidence_uncertain: usize,
    pub confidence_unknown: usize,
    pub confidence_note: String,
}

impl VerificationSummary {
    /// Count statuses and confidence levels.
    #[must_use]
    pub fn build(
        results: &[ContentResult],
        expectations: &[Expectation],
        structural_issues: usize,
    ) -> Self {
        let count_status = |status| results.iter().filter(|r| r.status == status).count();
        let count_conf = |conf| expectations.iter().filter(|e| e.confidence == conf).count();
        let known = count_conf(Confidence::Known);
        let uncertain = count_conf(Confidence::Uncertain);
        let unknown = count_conf(Confidence::Unknown);

        let mut parts = Vec::new();
        if known > 0 {
            parts.push(format!("{known} known"));
        }
        if uncertain > 0 {
            parts.push(format!("{uncertain} uncertain"));
        }
        if unknown > 0 {
            parts.push(format!("{unknown} unknown"));
        }
        let mut note = parts.join(", ");
        if uncertain > 0 || unknown > 0 {
            note.push_str(" - manual review needed");
        }

        Self {
            total: expectations.len(),
            matched: count_status(ContentStatus::Matched),
            mismatched: count_status(ContentStatus::Mismatched),
            missing: count_status(ContentStatus::Missing),
            structural_issues,
            confidence_known: known,
            confidence_uncertain: uncertain,
            confidence_unknown: unknown,
            confidence_note: note,
        }
    }

    /// True when every expectation matched and the structure is sound.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.matched == self.total && self.structural_issues == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub structural_issues: Vec<String>,
    pub content_results: Vec<ContentResult>,
    pub summary: VerificationSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub written: usize,
    pub skipped: usize,
}

/// Result of a write call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOutcome {
    /// The filled document.
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub summary: WriteSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Dry-run classification of one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    /// The target is empty or only holds a placeholder.
    Ok,
    /// The target already holds text that the answer would touch.
    Occupied,
    /// The answer is the skip sentinel.
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub identifier: String,
    pub locator: String,
    pub current_text: String,
    pub would_write: String,
    pub mode: InsertionMode,
    pub status: PreviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
