//! Cross-validation of generative amounts against OCR text.
//!
//! Currency-marked text is the strongest evidence, and exact agreement
//! the strongest of all. Near-agreement favors OCR, which reads literal
//! pixels, over the model's guess. Total disagreement surfaces as low
//! confidence rather than silently trusting either source.

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::config::ChitConfig;
use crate::models::receipt::{Confidence, ValidationOutcome};

use super::rules::amounts::{currency_amounts, parse_amount};
use super::rules::patterns::VALIDATION_NUMBER;

/// Reconciles a generative amount with the OCR transcription.
pub struct CrossValidator {
    exact_tolerance: Decimal,
    near_match_ratio: Decimal,
    min_amount: Decimal,
    max_amount: Decimal,
}

impl CrossValidator {
    pub fn new(config: &ChitConfig) -> Self {
        Self {
            exact_tolerance: config.validation.exact_tolerance,
            near_match_ratio: config.validation.near_match_ratio,
            min_amount: config.scanner.min_amount,
            max_amount: config.scanner.max_amount,
        }
    }

    pub fn validate(&self, generative_amount: Decimal, ocr_text: &str) -> ValidationOutcome {
        // Nothing to check against: trust the model, but only so far.
        if ocr_text.trim().is_empty() {
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::Medium,
                resolved_amount: generative_amount,
            };
        }

        let marked = currency_amounts(ocr_text, self.min_amount, self.max_amount);
        if !marked.is_empty() {
            return self.against_marked(generative_amount, &marked);
        }

        let bare = self.bare_numbers(ocr_text);
        if bare.is_empty() {
            // OCR saw text but no usable numbers at all.
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::Low,
                resolved_amount: generative_amount,
            };
        }
        self.against_bare(generative_amount, &bare)
    }

    fn against_marked(&self, generative: Decimal, marked: &[Decimal]) -> ValidationOutcome {
        if marked
            .iter()
            .any(|v| (*v - generative).abs() <= self.exact_tolerance)
        {
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::High,
                resolved_amount: generative,
            };
        }

        let window = generative * self.near_match_ratio;
        let near = marked
            .iter()
            .filter(|v| (**v - generative).abs() <= window)
            .min_by_key(|v| (**v - generative).abs());
        if let Some(v) = near {
            debug!("near-match correction {generative} -> {v}");
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::Medium,
                resolved_amount: *v,
            };
        }

        // Mismatch: report the largest OCR figure and flag the result.
        let largest = marked.iter().copied().max().unwrap_or(generative);
        ValidationOutcome {
            is_valid: false,
            confidence: Confidence::Low,
            resolved_amount: largest,
        }
    }

    fn against_bare(&self, generative: Decimal, bare: &[Decimal]) -> ValidationOutcome {
        if bare.contains(&generative) {
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::High,
                resolved_amount: generative,
            };
        }
        if bare
            .iter()
            .any(|v| (*v - generative).abs() <= self.exact_tolerance)
        {
            return ValidationOutcome {
                is_valid: true,
                confidence: Confidence::Medium,
                resolved_amount: generative,
            };
        }
        let closest = bare
            .iter()
            .copied()
            .min_by_key(|v| (*v - generative).abs())
            .unwrap_or(generative);
        ValidationOutcome {
            is_valid: false,
            confidence: Confidence::Low,
            resolved_amount: closest,
        }
    }

    fn bare_numbers(&self, text: &str) -> Vec<Decimal> {
        VALIDATION_NUMBER
            .find_iter(text)
            .filter_map(|m| parse_amount(m.as_str()))
            .filter(|v| *v >= self.min_amount && *v <= self.max_amount)
            .collect()
    }
}

/// Validate with default settings.
pub fn validate(generative_amount: Decimal, ocr_text: &str) -> ValidationOutcome {
    CrossValidator::new(&ChitConfig::default()).validate(generative_amount, ocr_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_empty_ocr_trusts_model_at_medium() {
        let outcome = validate(dec("100.00"), "   ");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert_eq!(outcome.resolved_amount, dec("100.00"));
    }

    #[test]
    fn test_exact_currency_match_is_high() {
        let outcome = validate(dec("100.00"), "Paid via UPI ₹100 on checkout");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::High);
        assert_eq!(outcome.resolved_amount, dec("100.00"));
    }

    #[test]
    fn test_near_match_corrects_to_ocr() {
        // Within 5%: OCR wins on close mismatch.
        let outcome = validate(dec("100.00"), "Amount ₹97");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert_eq!(outcome.resolved_amount, dec("97"));
    }

    #[test]
    fn test_near_match_picks_closest() {
        let outcome = validate(dec("100.00"), "₹96 ₹98");
        assert_eq!(outcome.resolved_amount, dec("98"));
    }

    #[test]
    fn test_mismatch_reports_largest_ocr_amount() {
        let outcome = validate(dec("100.00"), "Fee ₹40 Tip ₹12");
        assert!(!outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Low);
        assert_eq!(outcome.resolved_amount, dec("40"));
    }

    #[test]
    fn test_out_of_range_currency_amounts_ignored() {
        // The ₹5 is below the plausible range; with no usable currency
        // marks, validation falls through to bare numbers.
        let outcome = validate(dec("100.00"), "₹5 and order no 100");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::High);
    }

    #[test]
    fn test_bare_exact_match_is_high() {
        let outcome = validate(dec("94"), "Auto fare total 94 paid");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::High);
        assert_eq!(outcome.resolved_amount, dec("94"));
    }

    #[test]
    fn test_bare_tolerance_match_is_medium() {
        let outcome = validate(dec("94.01"), "total 94 paid");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Medium);
        assert_eq!(outcome.resolved_amount, dec("94.01"));
    }

    #[test]
    fn test_bare_disagreement_picks_closest_at_low() {
        let outcome = validate(dec("100.00"), "ref 450 booking 72");
        assert!(!outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Low);
        assert_eq!(outcome.resolved_amount, dec("72"));
    }

    #[test]
    fn test_no_numbers_at_all_keeps_model_at_low() {
        let outcome = validate(dec("100.00"), "thank you for your order");
        assert!(outcome.is_valid);
        assert_eq!(outcome.confidence, Confidence::Low);
        assert_eq!(outcome.resolved_amount, dec("100.00"));
    }
}
