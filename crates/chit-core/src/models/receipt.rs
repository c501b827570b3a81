//! Receipt extraction data models.
//!
//! All of these are value objects scoped to a single extraction
//! invocation; nothing here outlives one receipt-processing call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order category attached to a receipt submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderCategory {
    /// Order expected to carry multiple purchased line items
    /// (grocery-style deliveries).
    Itemized,

    /// Single lump payment amount (ride fares, one-off charges).
    SingleAmount,
}

impl OrderCategory {
    /// Whether receipts of this category carry itemized content.
    pub fn is_itemized(&self) -> bool {
        matches!(self, OrderCategory::Itemized)
    }
}

impl std::fmt::Display for OrderCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderCategory::Itemized => write!(f, "itemized"),
            OrderCategory::SingleAmount => write!(f, "single-amount"),
        }
    }
}

/// Confidence tier for a resolved amount.
///
/// `High` means exact corroboration between the two sources, `Medium`
/// close corroboration or single-source trust, `Low` disagreement or no
/// corroboration. Ordering follows tier strength.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// A numeric value considered but not yet confirmed as the receipt's
/// true amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountCandidate {
    /// Parsed monetary value.
    pub value: Decimal,

    /// The line of OCR text the value was found on.
    pub source_line: String,

    /// Zero-based index of that line in the document.
    pub line_index: usize,

    /// Whether the value was currency-marked or sat on (or next to) a
    /// line containing a context keyword.
    pub has_context_keyword: bool,
}

/// A purchased line item parsed from receipt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Item name as printed.
    pub name: String,

    /// Quantity descriptor kept verbatim, unit text included
    /// (e.g. "500 g x 8").
    pub quantity: String,

    /// Final price for the line.
    pub price: Decimal,
}

impl ItemRecord {
    /// Key used to de-duplicate repeated OCR noise.
    pub fn dedup_key(&self) -> (String, Decimal) {
        (self.name.to_lowercase(), self.price)
    }
}

/// Schema-checked output of the generative extraction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeExtraction {
    /// Total amount the model read off the receipt.
    pub total_amount: Decimal,

    /// Line items, when the itemized instruction was used.
    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

/// Outcome of reconciling a generative amount against OCR text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// False when the two sources disagree beyond tolerance.
    pub is_valid: bool,

    /// Confidence tier the reconciliation policy assigned.
    pub confidence: Confidence,

    /// The amount to trust, possibly corrected from the generative guess.
    pub resolved_amount: Decimal,
}

/// Terminal path the pipeline took for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionPath {
    /// Generative amount cross-checked against OCR text.
    Validated,

    /// Generative extraction failed; heuristic scan of OCR text only.
    HeuristicOnly,

    /// Category is trusted; generative result taken as-is.
    ValidationSkipped,
}

/// The pipeline's final output, handed to the ledger sink.
///
/// Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Resolved total amount.
    pub total_amount: Decimal,

    /// Purchased items, empty for amount-only receipts.
    #[serde(default)]
    pub items: Vec<ItemRecord>,

    /// Confidence tier of the resolved amount.
    pub confidence: Confidence,

    /// Whether validation replaced the generative amount.
    pub amount_corrected: bool,

    /// The generative amount before correction, when corrected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_amount: Option<Decimal>,

    /// Which terminal path produced this result.
    pub path: ExtractionPath,

    /// Issues encountered along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Raw OCR text retained as an audit trail, when captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,

    /// Processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

/// Submission metadata recorded alongside a result in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionMeta {
    /// Who submitted the receipt.
    pub submitted_by: String,

    /// When it was submitted.
    pub submitted_at: DateTime<Utc>,

    /// Outlet the submission belongs to, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet: Option<String>,

    /// Order category the submitter selected.
    pub category: OrderCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::High > Confidence::Medium);
        assert!(Confidence::Medium > Confidence::Low);
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Confidence::High).unwrap(),
            "\"high\""
        );
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&OrderCategory::SingleAmount).unwrap(),
            "\"single-amount\""
        );
        let parsed: OrderCategory = serde_json::from_str("\"itemized\"").unwrap();
        assert_eq!(parsed, OrderCategory::Itemized);
    }

    #[test]
    fn test_item_dedup_key_ignores_case() {
        let a = ItemRecord {
            name: "Toned Milk".to_string(),
            quantity: "1".to_string(),
            price: Decimal::from_str("28.00").unwrap(),
        };
        let b = ItemRecord {
            name: "TONED MILK".to_string(),
            quantity: "500 ml x 1".to_string(),
            price: Decimal::from_str("28.00").unwrap(),
        };
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
