//! Applying answers to one in-memory copy of a document.
//!
//! Everything that can fail is checked in a planning pass before the first
//! mutation: resolution, fragment checks, target existence and placeholder
//! presence. Mutations then run in caller order and the copy is serialized
//! once.

use tracing::{debug, info};

use crate::adapter::{ApplyOutcome, Document};
use crate::error::Violation;
use crate::formatting::build_native_fragment;
use crate::fragment::{check_inline_string, check_ooxml_fragment};
use crate::index::check_size;
use crate::placeholder::{PlaceholderMatcher, PlaceholderPatterns};
use crate::resolve::{MalformedCells, resolve_targets};
use crate::types::{
    Answer, AnswerContent, DocumentKind, FillOptions, InsertionMode, NativeFragment, WriteOutcome,
    WriteSummary,
};
use crate::validate::check_answers;
use crate::{DocfillError, Result};

/// One answer ready to apply.
struct PlannedWrite<'a> {
    answer: &'a Answer,
    locator: String,
    fragment: NativeFragment,
}

pub(crate) fn matcher_for<'a>(
    answer: &'a Answer,
    patterns: &'a PlaceholderPatterns,
) -> PlaceholderMatcher<'a> {
    match answer.placeholder.as_deref() {
        Some(marker) if !marker.is_empty() => PlaceholderMatcher::Literal(marker),
        _ => PlaceholderMatcher::Patterns(patterns),
    }
}

/// Reject prebuilt fragments that do not fit the document kind.
fn check_prebuilt(kind: DocumentKind, pending: &[(usize, &Answer)]) -> Result<()> {
    let mut violations = Vec::new();
    for &(index, answer) in pending {
        let AnswerContent::Prebuilt(markup) = &answer.content else {
            continue;
        };
        let checked = match kind {
            DocumentKind::Flow => check_ooxml_fragment(markup).map(|_| ()),
            DocumentKind::Spreadsheet => check_inline_string(markup),
            DocumentKind::Form => Ok(()),
        };
        if let Err(message) = checked {
            violations.push(Violation::new(index, Some(&answer.identifier), message));
        }
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(DocfillError::InvalidFragment { violations })
    }
}

fn native_fragment(
    document: &Document,
    answer: &Answer,
    locator: &str,
) -> Result<NativeFragment> {
    let kind = document.kind();
    Ok(match &answer.content {
        AnswerContent::PlainText(text) => {
            let formatting = document.formatting_at(locator)?.unwrap_or_default();
            build_native_fragment(kind, text, &formatting)
        }
        AnswerContent::Prebuilt(markup) => match kind {
            DocumentKind::Flow => NativeFragment::Ooxml(markup.clone()),
            DocumentKind::Spreadsheet => NativeFragment::InlineString(markup.clone()),
            DocumentKind::Form => NativeFragment::FieldValue(markup.clone()),
        },
    })
}

fn target_not_found(answer: &Answer, locator: &str) -> DocfillError {
    DocfillError::TargetNotFound {
        identifier: answer.identifier.clone(),
        locator: locator.to_string(),
    }
}

fn placeholder_not_found(answer: &Answer, matcher: PlaceholderMatcher<'_>) -> DocfillError {
    DocfillError::PlaceholderNotFound {
        identifier: answer.identifier.clone(),
        marker: matcher.describe(),
    }
}

pub(crate) fn write_answers(
    bytes: &[u8],
    answers: &[Answer],
    options: &FillOptions,
) -> Result<WriteOutcome> {
    check_size(bytes, options)?;
    check_answers(answers, options.max_answers)?;

    let pending: Vec<(usize, &Answer)> = answers
        .iter()
        .enumerate()
        .filter(|(_, answer)| !answer.is_skip())
        .collect();
    let skipped = answers.len() - pending.len();

    if pending.is_empty() {
        info!(target: "docfill::write", skipped, "nothing to write; returning input unchanged");
        return Ok(WriteOutcome {
            bytes: bytes.to_vec(),
            summary: WriteSummary {
                written: 0,
                skipped,
            },
            warnings: Vec::new(),
        });
    }

    let patterns = PlaceholderPatterns::from_options(options)?;
    let mut document = Document::parse(bytes)?;
    let kind = document.kind();
    let targets = resolve_targets(
        &document,
        bytes,
        &pending,
        &patterns,
        options,
        MalformedCells::Reject,
    )?;
    let warnings: Vec<String> = targets.iter().filter_map(|t| t.warning.clone()).collect();
    check_prebuilt(kind, &pending)?;

    let mut plan = Vec::with_capacity(pending.len());
    for (&(_, answer), target) in pending.iter().zip(targets) {
        let locator = target.locator;
        if !document.contains(&locator)? {
            return Err(target_not_found(answer, &locator));
        }
        if answer.mode == InsertionMode::ReplacePlaceholder {
            let matcher = matcher_for(answer, &patterns);
            let current = document.text_at(&locator)?.unwrap_or_default();
            if matcher.find(&current).is_none() {
                return Err(placeholder_not_found(answer, matcher));
            }
        }
        let fragment = native_fragment(&document, answer, &locator)?;
        plan.push(PlannedWrite {
            answer,
            locator,
            fragment,
        });
    }
    debug!(target: "docfill::write", %kind, planned = plan.len(), "write plan ready");

    for step in &plan {
        let matcher = matcher_for(step.answer, &patterns);
        match document.apply(&step.locator, &step.fragment, step.answer.mode, matcher)? {
            ApplyOutcome::Applied => {}
            ApplyOutcome::TargetMissing => return Err(target_not_found(step.answer, &step.locator)),
            ApplyOutcome::PlaceholderMissing => {
                return Err(placeholder_not_found(step.answer, matcher));
            }
        }
    }

    let output = document.to_bytes(bytes)?;
    let summary = WriteSummary {
        written: plan.len(),
        skipped,
    };
    info!(
        target: "docfill::write",
        %kind,
        written = summary.written,
        skipped = summary.skipped,
        warnings = warnings.len(),
        "write complete"
    );
    Ok(WriteOutcome {
        bytes: output,
        summary,
        warnings,
    })
}
