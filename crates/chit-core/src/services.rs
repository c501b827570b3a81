//! Collaborator seams for the extraction pipeline.
//!
//! The pipeline never owns a wire format; it talks to its collaborators
//! through these narrow traits, injected at construction time so the
//! heuristic components stay deterministic under test.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::models::receipt::{ExtractionResult, SubmissionMeta};

/// Deterministic OCR: image bytes in, best-effort transcription out.
///
/// An empty string is a valid answer (no text found) and must not be
/// reported as an error.
#[async_trait]
pub trait OcrService: Send + Sync {
    async fn recognize_text(&self, image: &[u8]) -> Result<String, ServiceError>;
}

/// Vision-capable generative model: instruction plus image in, raw
/// response text out. Parsing the response is the caller's problem.
#[async_trait]
pub trait GenerativeService: Send + Sync {
    async fn generate(&self, instruction: &str, image: &[u8]) -> Result<String, ServiceError>;
}

/// Durable storage for finished extraction results.
#[async_trait]
pub trait LedgerSink: Send + Sync {
    async fn record(
        &self,
        result: &ExtractionResult,
        meta: &SubmissionMeta,
    ) -> Result<(), ServiceError>;
}
