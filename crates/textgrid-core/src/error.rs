//! Error types for the textgrid-core library.

use thiserror::Error;

/// Main error type for the textgrid-core library.
///
/// The pure-compute parsing path almost never fails outward: an unparseable
/// sub-value becomes an absent field, a contradiction is silently discarded,
/// and a misbehaving extractor is caught at the orchestrator boundary and
/// turned into a warning on the returned `ParsedInvoice` rather than an
/// `Err`. This type exists for the few cases that are a precondition
/// violation rather than a data-quality issue.
#[derive(Error, Debug)]
pub enum Error {
    /// `Parse` was called with zero PDF variants and no email envelope
    /// fields at all, so there is nothing to build even a zero-confidence
    /// result from. A non-empty variant set with no extractable fields still
    /// returns `ParsedInvoice { confidence: 0.0, .. }` rather than this
    /// error; this variant is reserved for callers that supply nothing.
    #[error("no document variants or email envelope supplied")]
    EmptyDocumentSet,

    /// Raised internally when a single extractor invocation cannot be
    /// completed; caught at the orchestrator boundary and converted into a
    /// `"ParsingError"` warning rather than surfaced to the caller.
    #[error("extraction failed: {0}")]
    Extraction(String),
}

/// Result type for the textgrid-core library.
pub type Result<T> = std::result::Result<T, Error>;
