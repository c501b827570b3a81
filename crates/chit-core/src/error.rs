//! Error types for the chit-core library.

use thiserror::Error;

/// Main error type for the chit library.
#[derive(Error, Debug)]
pub enum ChitError {
    /// Failure talking to an external collaborator service.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),

    /// Receipt extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the external OCR, generative, and ledger collaborators.
///
/// These cover transport and protocol failures only; an empty OCR
/// transcription or an unparseable model response is not a `ServiceError`.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never completed (connection, timeout, DNS).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The image payload was rejected before dispatch.
    #[error("image payload rejected: {0}")]
    Payload(String),

    /// The ledger sink could not persist the result.
    #[error("ledger write failed: {0}")]
    Ledger(String),
}

/// Errors related to receipt extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// OCR produced no usable text.
    #[error("no text found in image")]
    NoTextFound,

    /// The model returned an explicit error, malformed JSON, or no
    /// numeric total.
    #[error("generative extraction failed: {0}")]
    GenerativeFailed(String),

    /// Both the generative and heuristic paths failed to produce a
    /// plausible amount. The one condition surfaced to the end user.
    #[error("no amount could be determined from the receipt")]
    NoAmountDeterminable,
}

/// Result type for the chit library.
pub type Result<T> = std::result::Result<T, ChitError>;
