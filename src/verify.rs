//! Read-only comparison of expected and actual content.

use tracing::{debug, info};

use crate::adapter::{Document, text_matches};
use crate::index::check_size;
use crate::placeholder::PlaceholderPatterns;
use crate::resolve::{MalformedCells, resolve_targets};
use crate::types::{
    ContentResult, ContentStatus, Expectation, FillOptions, VerificationReport,
    VerificationSummary,
};
use crate::validate::check_expectations;
use crate::{DocfillError, Result};

pub(crate) fn verify_expectations(
    bytes: &[u8],
    expectations: &[Expectation],
    options: &FillOptions,
) -> Result<VerificationReport> {
    check_size(bytes, options)?;
    check_expectations(expectations, options.max_answers)?;

    let patterns = PlaceholderPatterns::from_options(options)?;
    let document = Document::parse(bytes)?;
    let kind = document.kind();
    let entries: Vec<(usize, &Expectation)> = expectations.iter().enumerate().collect();
    let targets = resolve_targets(
        &document,
        bytes,
        &entries,
        &patterns,
        options,
        MalformedCells::Keep,
    )?;

    let mut warnings = Vec::new();
    let mut content_results = Vec::with_capacity(expectations.len());
    for (expectation, target) in expectations.iter().zip(targets) {
        if let Some(warning) = target.warning {
            warnings.push(warning);
        }
        let current = match document.text_at(&target.locator) {
            Err(DocfillError::InvalidLocator { locator, reason }) => {
                debug!(target: "docfill::verify", %locator, %reason, "locator addresses nothing");
                None
            }
            other => other?,
        };
        let (actual, status) = match current {
            None => (String::new(), ContentStatus::Missing),
            Some(actual) if text_matches(kind, &expectation.expected, &actual) => {
                (actual, ContentStatus::Matched)
            }
            Some(actual) => (actual, ContentStatus::Mismatched),
        };
        content_results.push(ContentResult {
            identifier: expectation.identifier.clone(),
            locator: target.locator,
            expected: expectation.expected.clone(),
            actual,
            status,
            resolved_from: target.resolved_from,
        });
    }

    let structural_issues = document.structural_issues();
    let summary =
        VerificationSummary::build(&content_results, expectations, structural_issues.len());
    info!(
        target: "docfill::verify",
        %kind,
        total = summary.total,
        matched = summary.matched,
        mismatched = summary.mismatched,
        missing = summary.missing,
        structural = summary.structural_issues,
        "verification complete"
    );
    Ok(VerificationReport {
        structural_issues,
        content_results,
        summary,
        warnings,
    })
}
