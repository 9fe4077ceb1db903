//! Batch validation of caller-supplied answers and expectations.
//!
//! Every entry is checked before anything is reported, so one error lists
//! all offending entries.

use tracing::debug;

use crate::types::{
    Answer, AnswerContent, Confidence, Expectation, InsertionMode, RawAnswer, RawExpectation,
};
use crate::error::Violation;
use crate::{DocfillError, Result};

const BATCH_LABEL: &str = "<batch>";

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

fn batch_limit(len: usize, max: usize, what: &str) -> Option<Violation> {
    (len > max).then(|| {
        Violation::new(
            max,
            Some(BATCH_LABEL),
            format!("batch holds {len} {what}, above the limit of {max}; split it into smaller batches"),
        )
    })
}

fn parse_confidence(
    raw: Option<&String>,
    index: usize,
    identifier: Option<&str>,
    violations: &mut Vec<Violation>,
) -> Option<Confidence> {
    let raw = raw?;
    let parsed = Confidence::parse(raw);
    if parsed.is_none() {
        violations.push(Violation::new(
            index,
            identifier,
            format!("unknown confidence '{raw}' (expected known, uncertain or unknown)"),
        ));
    }
    parsed
}

/// Validate raw answers into typed ones, collecting every violation.
///
/// Returns the answers plus non-fatal warnings (unknown fields, a marker on
/// a non-placeholder mode). The skip sentinel is a valid text here.
pub fn validate_answers(
    raw: &[RawAnswer],
    max_answers: usize,
) -> Result<(Vec<Answer>, Vec<String>)> {
    let mut violations: Vec<Violation> = batch_limit(raw.len(), max_answers, "answers")
        .into_iter()
        .collect();
    let mut warnings = Vec::new();
    let mut answers = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        let before = violations.len();
        let identifier = present(entry.identifier.as_ref());
        if identifier.is_none() {
            violations.push(Violation::new(
                index,
                None,
                "missing identifier; copy it from the extracted structure",
            ));
        }

        let mode = match entry.mode.as_deref() {
            Some(raw_mode) => {
                let parsed = InsertionMode::parse(raw_mode);
                if parsed.is_none() {
                    violations.push(Violation::new(
                        index,
                        identifier,
                        format!(
                            "unknown mode '{raw_mode}' (expected replace_content, append or replace_placeholder)"
                        ),
                    ));
                }
                parsed
            }
            None => None,
        };
        let confidence = parse_confidence(entry.confidence.as_ref(), index, identifier, &mut violations);

        let content = match (&entry.text, &entry.fragment) {
            (Some(_), Some(_)) => {
                violations.push(Violation::new(
                    index,
                    identifier,
                    "both text and fragment supplied; supply exactly one content source",
                ));
                None
            }
            (None, None) => {
                violations.push(Violation::new(
                    index,
                    identifier,
                    "neither text nor fragment supplied; supply exactly one content source",
                ));
                None
            }
            (Some(text), None) => Some(AnswerContent::PlainText(text.clone())),
            (None, Some(fragment)) => {
                if entry.mode.is_none() {
                    violations.push(Violation::new(
                        index,
                        identifier,
                        "a prebuilt fragment needs an explicit mode",
                    ));
                }
                Some(AnswerContent::Prebuilt(fragment.clone()))
            }
        };

        if entry.placeholder.as_deref().is_some_and(str::is_empty) {
            violations.push(Violation::new(
                index,
                identifier,
                "placeholder marker is empty; omit it to use the default patterns",
            ));
        }

        let label = identifier.unwrap_or("<missing>");
        for key in entry.extra.keys() {
            warnings.push(format!("answer '{label}' (index {index}): unknown field '{key}' ignored"));
        }
        let mode = mode.unwrap_or_default();
        if entry.placeholder.is_some() && mode != InsertionMode::ReplacePlaceholder {
            warnings.push(format!(
                "answer '{label}' (index {index}): placeholder marker is only used by replace_placeholder"
            ));
        }

        if violations.len() > before {
            continue;
        }
        if let (Some(identifier), Some(content)) = (identifier, content) {
            answers.push(Answer {
                identifier: identifier.to_string(),
                locator: present(entry.locator.as_ref()).map(ToString::to_string),
                content,
                mode,
                placeholder: entry.placeholder.clone(),
                confidence,
            });
        }
    }

    if !violations.is_empty() {
        debug!(target: "docfill::validate", violations = violations.len(), "answer batch rejected");
        return Err(DocfillError::InvalidAnswers { violations });
    }
    Ok((answers, warnings))
}

/// Validate raw expectations, collecting every violation.
pub fn validate_expectations(raw: &[RawExpectation], max_answers: usize) -> Result<Vec<Expectation>> {
    let mut violations: Vec<Violation> = batch_limit(raw.len(), max_answers, "expectations")
        .into_iter()
        .collect();
    let mut expectations = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        let before = violations.len();
        let identifier = present(entry.identifier.as_ref());
        if identifier.is_none() {
            violations.push(Violation::new(index, None, "missing identifier"));
        }
        if entry.expected.is_none() {
            violations.push(Violation::new(index, identifier, "missing expected text"));
        }
        let confidence = parse_confidence(entry.confidence.as_ref(), index, identifier, &mut violations);

        if violations.len() > before {
            continue;
        }
        if let (Some(identifier), Some(expected)) = (identifier, &entry.expected) {
            expectations.push(Expectation {
                identifier: identifier.to_string(),
                locator: present(entry.locator.as_ref()).map(ToString::to_string),
                expected: expected.clone(),
                confidence: confidence.unwrap_or_default(),
            });
        }
    }

    if !violations.is_empty() {
        return Err(DocfillError::InvalidExpectations { violations });
    }
    Ok(expectations)
}

/// Checks that typed answers cannot enforce by construction.
pub(crate) fn check_answers(answers: &[Answer], max_answers: usize) -> Result<()> {
    let mut violations: Vec<Violation> = batch_limit(answers.len(), max_answers, "answers")
        .into_iter()
        .collect();
    for (index, answer) in answers.iter().enumerate() {
        if answer.identifier.trim().is_empty() {
            violations.push(Violation::new(index, None, "missing identifier"));
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DocfillError::InvalidAnswers { violations })
    }
}

/// Same as [`check_answers`] for expectations.
pub(crate) fn check_expectations(expectations: &[Expectation], max_answers: usize) -> Result<()> {
    let mut violations: Vec<Violation> =
        batch_limit(expectations.len(), max_answers, "expectations")
            .into_iter()
            .collect();
    for (index, expectation) in expectations.iter().enumerate() {
        if expectation.identifier.trim().is_empty() {
            violations.push(Violation::new(index, None, "missing identifier"));
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DocfillError::InvalidExpectations { violations })
    }
}
