//! Heuristic scanners over raw OCR text.

pub mod amounts;
pub mod items;
pub mod patterns;

pub use amounts::{currency_amounts, parse_amount, scan_candidates, CandidateScanner};
pub use items::{parse_items, ItemParser};
