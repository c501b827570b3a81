//! Data models for the receipt extraction pipeline.

pub mod config;
pub mod receipt;

pub use config::ChitConfig;
pub use receipt::{
    AmountCandidate, Confidence, ExtractionPath, ExtractionResult, GenerativeExtraction,
    ItemRecord, OrderCategory, SubmissionMeta, ValidationOutcome,
};
