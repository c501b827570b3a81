//! Receipt extraction module.

pub mod generative;
mod pipeline;
pub mod rules;
mod validator;

pub use pipeline::ReceiptPipeline;
pub use rules::amounts::{scan_candidates, CandidateScanner};
pub use rules::items::{parse_items, ItemParser};
pub use validator::{validate, CrossValidator};
