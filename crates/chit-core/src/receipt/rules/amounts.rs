//! Amount candidate scanning over raw OCR text.
//!
//! Two passes in strict priority order: currency-marked figures are
//! unambiguous ground truth when present, while bare numbers need
//! disambiguation against the clocks, dates, and distances that litter
//! receipt screenshots.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use crate::models::config::ScannerConfig;
use crate::models::receipt::AmountCandidate;

use super::patterns::{BARE_NUMBER, CURRENCY_AMOUNT, DISTANCE_UNIT, MERIDIEM, MONTH_NAME};

/// Parse an amount with loose comma grouping ("1,23,456.78").
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// All currency-marked amounts in `text` within `min..=max`, in
/// document order.
pub fn currency_amounts(text: &str, min: Decimal, max: Decimal) -> Vec<Decimal> {
    CURRENCY_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| parse_amount(&caps[1]))
        .filter(|v| *v >= min && *v <= max)
        .collect()
}

/// Amount candidate scanner.
pub struct CandidateScanner {
    config: ScannerConfig,
}

impl CandidateScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Scan text for ranked amount candidates.
    ///
    /// Returns an empty vec when nothing plausible is found; the scanner
    /// never guesses.
    pub fn scan(&self, text: &str) -> Vec<AmountCandidate> {
        // Currency marks take strict precedence: even when every marked
        // figure is out of range, bare numbers are not consulted.
        if CURRENCY_AMOUNT.is_match(text) {
            let currency = self.currency_pass(text);
            debug!("currency pass found {} candidate(s)", currency.len());
            return currency;
        }
        self.context_pass(text)
    }

    /// The single best candidate per the selection order.
    pub fn best(&self, text: &str) -> Option<AmountCandidate> {
        self.scan(text).into_iter().next()
    }

    /// Currency-marked figures take strict precedence over anything the
    /// context pass could find.
    fn currency_pass(&self, text: &str) -> Vec<AmountCandidate> {
        let mut out = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            for caps in CURRENCY_AMOUNT.captures_iter(line) {
                let Some(value) = parse_amount(&caps[1]) else {
                    continue;
                };
                if value < self.config.min_amount || value > self.config.max_amount {
                    continue;
                }
                out.push(AmountCandidate {
                    value,
                    source_line: line.trim().to_string(),
                    line_index: idx,
                    has_context_keyword: true,
                });
            }
        }
        out.sort_by(|a, b| b.value.cmp(&a.value));
        out
    }

    fn context_pass(&self, text: &str) -> Vec<AmountCandidate> {
        let lines: Vec<&str> = text.lines().collect();
        let lowered: Vec<String> = lines.iter().map(|l| l.to_lowercase()).collect();
        let keyword_on = |i: usize| {
            self.config
                .context_keywords
                .iter()
                .any(|k| lowered[i].contains(k))
        };

        let mut keyword_hits = Vec::new();
        let mut head_hits = Vec::new();
        let mut rest = Vec::new();

        for (idx, line) in lines.iter().enumerate() {
            let qualified = keyword_on(idx)
                || (idx > 0 && keyword_on(idx - 1))
                || (idx + 1 < lines.len() && keyword_on(idx + 1));
            let in_head = idx < self.config.head_lines;
            if !qualified && !in_head {
                continue;
            }
            // A month name marks every number on the line as a date part.
            if MONTH_NAME.is_match(line) {
                continue;
            }
            for m in BARE_NUMBER.find_iter(line) {
                if !token_is_clean(line, m.start(), m.end()) {
                    continue;
                }
                let Some(value) = parse_amount(m.as_str()) else {
                    continue;
                };
                if value < self.config.min_amount || value > self.config.bare_max_amount {
                    continue;
                }
                let candidate = AmountCandidate {
                    value,
                    source_line: line.trim().to_string(),
                    line_index: idx,
                    has_context_keyword: qualified,
                };
                if qualified {
                    keyword_hits.push(candidate);
                } else if in_head {
                    head_hits.push(candidate);
                } else {
                    rest.push(candidate);
                }
            }
        }

        // Selection order: keyword-qualified first, then document head,
        // then whatever remains, each bucket by value descending.
        keyword_hits.sort_by(|a, b| b.value.cmp(&a.value));
        head_hits.sort_by(|a, b| b.value.cmp(&a.value));
        rest.sort_by(|a, b| b.value.cmp(&a.value));
        keyword_hits.extend(head_hits);
        keyword_hits.extend(rest);
        keyword_hits
    }
}

/// Reject tokens glued to a larger numeric literal or trailed by a
/// clock, meridiem, or distance marker.
fn token_is_clean(line: &str, start: usize, end: usize) -> bool {
    if let Some(c) = line[..start].chars().next_back() {
        if c == ':' || c == '.' || c == ',' || c.is_ascii_digit() {
            return false;
        }
    }
    let after = &line[end..];
    match after.chars().next() {
        Some(':') => return false,
        Some('.') | Some(',') => {
            // Part of a longer literal only when a digit follows.
            if after.chars().nth(1).is_some_and(|c| c.is_ascii_digit()) {
                return false;
            }
        }
        Some(c) if c.is_ascii_digit() => return false,
        _ => {}
    }
    !(MERIDIEM.is_match(after) || DISTANCE_UNIT.is_match(after))
}

/// Scan with default settings.
pub fn scan_candidates(text: &str) -> Vec<AmountCandidate> {
    CandidateScanner::new(ScannerConfig::default()).scan(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scanner() -> CandidateScanner {
        CandidateScanner::new(ScannerConfig::default())
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_currency_symbol_takes_precedence() {
        let text = "Trip started 1430\nFare ₹245.50\nDistance 12\n";
        let candidates = scanner().scan(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, dec("245.50"));
        assert!(candidates[0].has_context_keyword);
    }

    #[test]
    fn test_currency_variants() {
        for text in ["Total Rs. 480", "Total Rs 480", "Total INR 480", "Total ₹480"] {
            let candidates = scanner().scan(text);
            assert_eq!(candidates.len(), 1, "failed on {text:?}");
            assert_eq!(candidates[0].value, dec("480"));
        }
    }

    #[test]
    fn test_lakh_grouping_parses() {
        assert_eq!(parse_amount("1,23,456.78"), Some(dec("123456.78")));
        assert_eq!(parse_amount("1,234"), Some(dec("1234")));
    }

    #[test]
    fn test_currency_range_filter() {
        // 9 below range, 75,000 above: both discarded before ranking.
        let text = "Tip ₹9\nGrand total ₹75,000\nPaid ₹450";
        let candidates = scanner().scan(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, dec("450"));
    }

    #[test]
    fn test_currency_candidates_ranked_descending() {
        let text = "Item ₹120\nItem ₹89\nTotal ₹209";
        let values: Vec<Decimal> = scanner().scan(text).iter().map(|c| c.value).collect();
        assert_eq!(values, vec![dec("209"), dec("120"), dec("89")]);
    }

    #[test]
    fn test_context_keyword_line_wins() {
        let mut text = String::new();
        for i in 0..12 {
            text.push_str(&format!("noise line {i}\n"));
        }
        text.push_str("Total fare\n");
        text.push_str("450\n");
        let best = scanner().best(&text).unwrap();
        assert_eq!(best.value, dec("450"));
        assert!(best.has_context_keyword);
    }

    #[test]
    fn test_clock_date_distance_rejected() {
        // The end-to-end shape from the field: 12:45 and 2.3 must never
        // become candidates.
        let text = "Auto fare\nTotal: ₹94\n12:45 PM\n2.3 km";
        let candidates = scanner().scan(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, dec("94"));
    }

    #[test]
    fn test_bare_clock_and_distance_rejected_without_currency() {
        let text = "Auto ride\n12:45 PM\n7 pm pickup\n2.3 km\n450 m walk\nfare 94";
        let candidates = scanner().scan(text);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, dec("94"));
    }

    #[test]
    fn test_month_line_rejected() {
        let text = "Booked 14 March\nbooking cost\n320";
        let best = scanner().best(text).unwrap();
        assert_eq!(best.value, dec("320"));
    }

    #[test]
    fn test_head_lines_scanned_without_keyword() {
        let text = "Receipt\n240\n";
        let best = scanner().best(text).unwrap();
        assert_eq!(best.value, dec("240"));
        assert!(!best.has_context_keyword);
    }

    #[test]
    fn test_bare_range_filter() {
        // Context pass caps out at 10,000 even though currency-marked
        // amounts would be allowed up to 50,000.
        let text = "amount due\n25000\n";
        assert!(scanner().scan(text).is_empty());
    }

    #[test]
    fn test_no_candidate_never_guesses() {
        assert!(scanner().scan("").is_empty());
        assert!(scanner().scan("thank you for riding with us").is_empty());
    }

    #[test]
    fn test_out_of_range_currency_never_falls_back_to_bare() {
        // A currency mark is present, so the bare 450 stays ignored even
        // though every marked figure was discarded.
        assert!(scanner().scan("Tip ₹5\ntotal 450").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let text = "Fare ₹245.50\nTotal ₹245.50";
        assert_eq!(scan_candidates(text), scan_candidates(text));
    }

    #[test]
    fn test_candidate_carries_source_line() {
        let best = scanner().best("Auto ride\nFare ₹245.50").unwrap();
        assert_eq!(best.source_line, "Fare ₹245.50");
        assert_eq!(best.line_index, 1);
    }
}
