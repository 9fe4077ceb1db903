//! Public types exposed by the `docfill-core` crate.

pub mod answer;
pub mod formatting;
pub mod options;
pub mod structure;
pub mod verification;

pub use answer::{
    Answer, AnswerContent, Confidence, Expectation, InsertionMode, RawAnswer, RawExpectation,
};
pub use formatting::{FormattingProperties, NativeFragment};
pub use options::{FillOptions, FillOptionsBuilder};
pub use structure::{CompactStructure, ComplexElement, DocumentKind, ResolutionResult};
pub use verification::{
    ContentResult, ContentStatus, PreviewEntry, PreviewStatus, ResolvedFrom, VerificationReport,
    VerificationSummary, WriteOutcome, WriteSummary,
};
