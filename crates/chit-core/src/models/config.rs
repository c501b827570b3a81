//! Configuration structures for the extraction pipeline.
//!
//! The keyword sets here are tuning data, not control flow; parsing
//! logic never needs to change when a keyword is added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::receipt::OrderCategory;

/// Main configuration for the chit pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChitConfig {
    /// Amount candidate scanner configuration.
    pub scanner: ScannerConfig,

    /// Item list parser configuration.
    pub items: ItemParserConfig,

    /// Cross-validation configuration.
    pub validation: ValidationConfig,

    /// External service configuration.
    pub services: ServiceConfig,
}

/// Amount candidate scanner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Lower bound of the plausible monetary range (inclusive).
    pub min_amount: Decimal,

    /// Upper bound of the plausible monetary range (inclusive).
    pub max_amount: Decimal,

    /// Upper bound for bare-number candidates from the context pass.
    pub bare_max_amount: Decimal,

    /// Lines from the top of the document scanned unconditionally.
    pub head_lines: usize,

    /// Keywords that qualify a line, or either neighbor, for the
    /// context-aware pass.
    pub context_keywords: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_amount: Decimal::new(10, 0),
            max_amount: Decimal::new(50_000, 0),
            bare_max_amount: Decimal::new(10_000, 0),
            head_lines: 10,
            context_keywords: [
                "fare", "total", "paid", "amount", "charge", "cost", "booking", "ride", "auto",
                "one-way",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Item list parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemParserConfig {
    /// Structural keywords; a line containing one is never an item line.
    pub stop_keywords: Vec<String>,
}

impl Default for ItemParserConfig {
    fn default() -> Self {
        Self {
            stop_keywords: [
                "order", "summary", "delivery", "total", "discount", "invoice", "rate this",
                "subtotal", "taxes", "handling", "savings", "payment", "bill",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Cross-validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute tolerance for treating two amounts as the same.
    pub exact_tolerance: Decimal,

    /// Relative window for near-match correction (0.05 = 5%).
    pub near_match_ratio: Decimal,

    /// Categories whose generative extraction is trusted outright;
    /// validation is skipped for these.
    pub trust_generative: Vec<OrderCategory>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            exact_tolerance: Decimal::new(1, 2),
            near_match_ratio: Decimal::new(5, 2),
            trust_generative: vec![OrderCategory::Itemized],
        }
    }
}

/// External service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Attempts per service call before giving up.
    pub max_attempts: u32,

    /// Base delay between attempts; grows linearly per attempt.
    pub retry_delay_ms: u64,

    /// Inbound image size cap in bytes.
    pub max_image_bytes: usize,

    /// Capture OCR text for the audit trail even when validation is
    /// skipped. Best-effort: a failed capture never fails the call.
    pub audit_ocr: bool,

    /// OCR service endpoint.
    pub ocr_endpoint: String,

    /// Generative extraction service endpoint.
    pub vision_endpoint: String,

    /// Model name sent to the generative service.
    pub vision_model: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 500,
            max_image_bytes: 10 * 1024 * 1024,
            audit_ocr: false,
            ocr_endpoint: "http://localhost:8089/v1/ocr".to_string(),
            vision_endpoint: "http://localhost:8090/v1/generate".to_string(),
            vision_model: "vision-default".to_string(),
        }
    }
}

impl ChitConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| crate::error::ChitError::Config(format!("{}: {e}", path.display())))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::ChitError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_carry_plausible_range() {
        let config = ChitConfig::default();
        assert_eq!(config.scanner.min_amount, Decimal::new(10, 0));
        assert_eq!(config.scanner.max_amount, Decimal::new(50_000, 0));
        assert_eq!(config.scanner.bare_max_amount, Decimal::new(10_000, 0));
        assert!(config.scanner.context_keywords.contains(&"fare".to_string()));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ChitConfig =
            serde_json::from_str(r#"{"services": {"max_attempts": 5}}"#).unwrap();
        assert_eq!(config.services.max_attempts, 5);
        assert_eq!(config.services.retry_delay_ms, 500);
        assert_eq!(config.scanner.head_lines, 10);
    }

    #[test]
    fn test_roundtrip() {
        let config = ChitConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ChitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.validation.trust_generative, vec![OrderCategory::Itemized]);
        assert_eq!(back.validation.exact_tolerance, Decimal::new(1, 2));
    }
}
