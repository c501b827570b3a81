//! Core library for receipt and order extraction.
//!
//! This crate provides:
//! - Heuristic amount candidate scanning over OCR text
//! - Item list parsing for grocery-style orders
//! - Generative (vision model) extraction with schema checking
//! - Cross-validation of the two sources under a corrective policy
//! - The orchestrating pipeline that sequences them per order category

pub mod error;
pub mod models;
pub mod receipt;
pub mod services;

pub use error::{ChitError, ExtractionError, Result, ServiceError};
pub use models::config::ChitConfig;
pub use models::receipt::{
    AmountCandidate, Confidence, ExtractionPath, ExtractionResult, GenerativeExtraction,
    ItemRecord, OrderCategory, SubmissionMeta, ValidationOutcome,
};
pub use receipt::{CandidateScanner, CrossValidator, ItemParser, ReceiptPipeline};
pub use services::{GenerativeService, LedgerSink, OcrService};
