//! Dry run of a write: where each answer lands and what it would replace.

use tracing::debug;

use crate::adapter::Document;
use crate::index::check_size;
use crate::placeholder::PlaceholderPatterns;
use crate::resolve::{MalformedCells, resolve_targets};
use crate::types::{
    Answer, FillOptions, InsertionMode, PreviewEntry, PreviewStatus,
};
use crate::validate::check_answers;
use crate::write::matcher_for;
use crate::{DocfillError, Result};

fn skip_entry(answer: &Answer) -> PreviewEntry {
    PreviewEntry {
        identifier: answer.identifier.clone(),
        locator: answer.locator.clone().unwrap_or_default(),
        current_text: String::new(),
        would_write: String::new(),
        mode: answer.mode,
        status: PreviewStatus::Skip,
        message: Some("skip sentinel; nothing will be written".into()),
    }
}

pub(crate) fn preview_answers(
    bytes: &[u8],
    answers: &[Answer],
    options: &FillOptions,
) -> Result<Vec<PreviewEntry>> {
    check_size(bytes, options)?;
    check_answers(answers, options.max_answers)?;

    let pending: Vec<(usize, &Answer)> = answers
        .iter()
        .enumerate()
        .filter(|(_, answer)| !answer.is_skip())
        .collect();
    if pending.is_empty() {
        return Ok(answers.iter().map(skip_entry).collect());
    }

    let patterns = PlaceholderPatterns::from_options(options)?;
    let document = Document::parse(bytes)?;
    let targets = resolve_targets(
        &document,
        bytes,
        &pending,
        &patterns,
        options,
        MalformedCells::Reject,
    )?;
    let mut targets = pending.iter().map(|(index, _)| *index).zip(targets).peekable();

    let mut entries = Vec::with_capacity(answers.len());
    for (index, answer) in answers.iter().enumerate() {
        let target = match targets.peek() {
            Some((next, _)) if *next == index => targets.next().map(|(_, target)| target),
            _ => None,
        };
        let Some(target) = target else {
            entries.push(skip_entry(answer));
            continue;
        };

        let current = document
            .text_at(&target.locator)?
            .ok_or_else(|| DocfillError::TargetNotFound {
                identifier: answer.identifier.clone(),
                locator: target.locator.clone(),
            })?;
        let holds_placeholder = if answer.mode == InsertionMode::ReplacePlaceholder {
            matcher_for(answer, &patterns).find(&current).is_some()
        } else {
            patterns.is_match(current.trim())
        };
        let (status, mut message) = if current.trim().is_empty() || holds_placeholder {
            (PreviewStatus::Ok, None)
        } else {
            let note = match answer.mode {
                InsertionMode::ReplaceContent => "existing text would be replaced",
                InsertionMode::Append => "answer would be appended after existing text",
                InsertionMode::ReplacePlaceholder => "no placeholder found in existing text",
            };
            (PreviewStatus::Occupied, Some(note.to_string()))
        };
        if let Some(warning) = target.warning {
            message = Some(match message {
                Some(note) => format!("{note}; {warning}"),
                None => warning,
            });
        }

        entries.push(PreviewEntry {
            identifier: answer.identifier.clone(),
            locator: target.locator,
            current_text: current,
            would_write: answer.content.as_str().to_string(),
            mode: answer.mode,
            status,
            message,
        });
    }
    debug!(
        target: "docfill::preview",
        kind = %document.kind(),
        entries = entries.len(),
        "preview complete"
    );
    Ok(entries)
}
