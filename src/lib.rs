#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions - these are allowed project-wide for pragmatic reasons:
//
// Documentation lints: Many internal/self-documenting functions don't need extensive docs.
// Public APIs should still have proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: All casts in this codebase are carefully reviewed and bounded by
// real-world constraints (document sizes, row and column counts). Using try_into() everywhere
// would add significant complexity without safety benefits in our use case.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Style/complexity: Format adapters walking nested markup naturally require complex functions.
// Breaking them up would hurt readability.
#![allow(clippy::too_many_lines)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::similar_names)]
// e.g., row_ref, col_ref, cell_ref are intentionally similar
//
// Pattern matching: These pedantic lints often suggest changes that reduce clarity.
#![allow(clippy::manual_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::if_same_then_else)]
#![allow(clippy::collapsible_match)]
//
// Performance/ergonomics trade-offs that are acceptable for this codebase:
#![allow(clippy::needless_pass_by_value)] // Many builders take owned values intentionally
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't need must_use on every method
#![allow(clippy::format_push_string)] // Readability over minor perf difference
#![allow(clippy::assigning_clones)] // clone_from() often less readable
//
// Low-value pedantic lints that add noise:
#![allow(clippy::struct_excessive_bools)] // Formatting records naturally have many flags
#![allow(clippy::needless_continue)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::case_sensitive_file_extension_comparisons)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::unreadable_literal)] // Spreadsheet limits read better as written
#![allow(clippy::implicit_hasher)]
#![allow(clippy::manual_clamp)]
#![allow(clippy::len_without_is_empty)] // Some record types don't need is_empty()
#![allow(clippy::large_enum_variant)]
#![allow(clippy::ptr_arg)]
#![allow(clippy::map_unwrap_or)]
#![allow(clippy::incompatible_msrv)]
#![allow(clippy::should_implement_trait)] // Some method names are clearer than trait names
#![allow(clippy::duplicated_attributes)]
//
// Return value wrapping: Many functions use Result for consistency even when they
// currently can't fail, allowing future error conditions to be added without breaking API.
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::unused_self)] // Some trait impls or future extensibility

//! Fill `.docx`, `.xlsx` and AcroForm `.pdf` templates by slot identifier.
//!
//! Every operation takes the document as a byte buffer and re-parses it; no
//! state survives a call. A typical round trip:
//!
//! 1. [`index`] the template and hand `compact_text` to whoever chooses answers.
//! 2. [`validate_answers`] the raw batch they send back.
//! 3. [`write`] the answers, optionally after a [`preview`].
//! 4. [`verify`] the output against the expected text.

/// The docfill-core crate version (matches `Cargo.toml`).
pub const DOCFILL_CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapter;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod fragment;
pub mod index;
mod package;
pub mod placeholder;
mod preview;
pub mod resolve;
pub mod types;
pub mod validate;
mod verify;
mod write;
pub mod xml;

pub use constants::*;
pub use error::{DocfillError, Result, Violation};
pub use formatting::{
    build_fragment, build_inline_string, build_native_fragment, extract_formatting,
    extract_formatting_from_xml,
};
pub use fragment::check_ooxml_fragment;
pub use index::source_digest;
pub use placeholder::{PlaceholderMatcher, PlaceholderPatterns};
pub use resolve::{cross_check, filter_resolved};
pub use types::{
    Answer, AnswerContent, CompactStructure, ComplexElement, Confidence, ContentResult,
    ContentStatus, DocumentKind, Expectation, FillOptions, FillOptionsBuilder,
    FormattingProperties, InsertionMode, NativeFragment, PreviewEntry, PreviewStatus, RawAnswer,
    RawExpectation, ResolutionResult, ResolvedFrom, VerificationReport, VerificationSummary,
    WriteOutcome, WriteSummary,
};
pub use validate::{validate_answers, validate_expectations};

use adapter::Document;
use resolve::{MalformedCells, ResolvedTarget, resolve_targets};

/// Entry point holding the options every call runs with.
///
/// The filler owns configuration only, so one instance can be shared
/// freely across threads.
#[derive(Debug, Clone, Default)]
pub struct DocumentFiller {
    options: FillOptions,
}

impl DocumentFiller {
    /// A filler with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: FillOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Index every fillable location of `bytes`.
    pub fn index(&self, bytes: &[u8]) -> Result<CompactStructure> {
        index::index_document(bytes, &self.options)
    }

    /// Map `identifiers` to locators against a fresh index; unknown ones are omitted.
    pub fn resolve<S: AsRef<str>>(&self, bytes: &[u8], identifiers: &[S]) -> Result<ResolutionResult> {
        resolve::resolve_identifiers(bytes, identifiers, &self.options)
    }

    /// Apply `answers` in order and return the filled document.
    ///
    /// Nothing is written unless every answer resolves, every prebuilt
    /// fragment passes its check and every target exists.
    pub fn write(&self, bytes: &[u8], answers: &[Answer]) -> Result<WriteOutcome> {
        write::write_answers(bytes, answers, &self.options)
    }

    /// Validate a raw batch, then [`write`](Self::write) it.
    ///
    /// Validation warnings come first in the outcome's warnings.
    pub fn write_raw(&self, bytes: &[u8], raw: &[RawAnswer]) -> Result<WriteOutcome> {
        let (answers, mut warnings) = validate_answers(raw, self.options.max_answers)?;
        let mut outcome = self.write(bytes, &answers)?;
        warnings.append(&mut outcome.warnings);
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Compare the text at each expectation's location with what it expects.
    pub fn verify(&self, bytes: &[u8], expectations: &[Expectation]) -> Result<VerificationReport> {
        verify::verify_expectations(bytes, expectations, &self.options)
    }

    pub fn verify_raw(&self, bytes: &[u8], raw: &[RawExpectation]) -> Result<VerificationReport> {
        let expectations = validate_expectations(raw, self.options.max_answers)?;
        self.verify(bytes, &expectations)
    }

    /// Report, without writing, where each answer would land and what it would replace.
    pub fn preview(&self, bytes: &[u8], answers: &[Answer]) -> Result<Vec<PreviewEntry>> {
        preview::preview_answers(bytes, answers, &self.options)
    }

    /// Formatting a plain-text answer written to `identifier` would inherit.
    pub fn formatting_at(&self, bytes: &[u8], identifier: &str) -> Result<FormattingProperties> {
        index::check_size(bytes, &self.options)?;
        let patterns = PlaceholderPatterns::from_options(&self.options)?;
        let document = Document::parse(bytes)?;
        let probe = Expectation::new(identifier, "");
        let targets = resolve_targets(
            &document,
            bytes,
            &[(0, &probe)],
            &patterns,
            &self.options,
            MalformedCells::Reject,
        )?;
        let Some(ResolvedTarget { locator, .. }) = targets.into_iter().next() else {
            return Err(DocfillError::UnresolvedIdentifier {
                index: 0,
                identifier: identifier.to_string(),
            });
        };
        document
            .formatting_at(&locator)?
            .ok_or_else(|| DocfillError::TargetNotFound {
                identifier: identifier.to_string(),
                locator,
            })
    }
}

/// [`DocumentFiller::index`] with default options.
pub fn index(bytes: &[u8]) -> Result<CompactStructure> {
    DocumentFiller::new().index(bytes)
}

/// [`DocumentFiller::resolve`] with default options.
pub fn resolve<S: AsRef<str>>(bytes: &[u8], identifiers: &[S]) -> Result<ResolutionResult> {
    DocumentFiller::new().resolve(bytes, identifiers)
}

/// [`DocumentFiller::write`] with default options.
pub fn write(bytes: &[u8], answers: &[Answer]) -> Result<WriteOutcome> {
    DocumentFiller::new().write(bytes, answers)
}

/// [`DocumentFiller::verify`] with default options.
pub fn verify(bytes: &[u8], expectations: &[Expectation]) -> Result<VerificationReport> {
    DocumentFiller::new().verify(bytes, expectations)
}

/// [`DocumentFiller::preview`] with default options.
pub fn preview(bytes: &[u8], answers: &[Answer]) -> Result<Vec<PreviewEntry>> {
    DocumentFiller::new().preview(bytes, answers)
}

/// [`DocumentFiller::formatting_at`] with default options.
pub fn formatting_at(bytes: &[u8], identifier: &str) -> Result<FormattingProperties> {
    DocumentFiller::new().formatting_at(bytes, identifier)
}
