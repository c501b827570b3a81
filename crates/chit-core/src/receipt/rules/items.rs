//! Item list parsing for grocery-style order receipts.

use std::collections::HashSet;

use tracing::debug;

use crate::models::config::ItemParserConfig;
use crate::models::receipt::ItemRecord;

use super::amounts::parse_amount;
use super::patterns::{CURRENCY_AMOUNT, QTY_DESCRIPTOR, SINGLE_LINE_ITEM};

/// Item list parser.
///
/// Recognizes the two common receipt layouts: a single-line form
/// (`2 x Toned Milk ₹56`) and a three-line form (name, quantity
/// descriptor, price line). Never raises on unparseable input; it
/// simply yields fewer items.
pub struct ItemParser {
    config: ItemParserConfig,
}

impl ItemParser {
    pub fn new(config: ItemParserConfig) -> Self {
        Self { config }
    }

    pub fn parse(&self, text: &str) -> Vec<ItemRecord> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut items = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            if line.is_empty() || self.is_stop_line(line) {
                i += 1;
                continue;
            }
            if let Some(item) = self.parse_single_line(line) {
                items.push(item);
                i += 1;
                continue;
            }
            if let Some(item) = self.parse_three_line(&lines, i) {
                items.push(item);
                i += 3;
                continue;
            }
            i += 1;
        }

        let deduped = dedup(items);
        debug!("parsed {} item(s)", deduped.len());
        deduped
    }

    fn is_stop_line(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.config.stop_keywords.iter().any(|k| lowered.contains(k))
    }

    /// `<qty> x <name> <currency><price>` on one line.
    fn parse_single_line(&self, line: &str) -> Option<ItemRecord> {
        let caps = SINGLE_LINE_ITEM.captures(line)?;
        let price = parse_amount(&caps[3])?;
        Some(ItemRecord {
            name: caps[2].trim().to_string(),
            quantity: caps[1].to_string(),
            price,
        })
    }

    /// Name line, quantity-descriptor line, then a line of one or more
    /// currency-marked prices. The last price is the post-discount one.
    fn parse_three_line(&self, lines: &[&str], i: usize) -> Option<ItemRecord> {
        if i + 2 >= lines.len() {
            return None;
        }
        let name = lines[i];
        if CURRENCY_AMOUNT.is_match(name) || !name.chars().any(|c| c.is_alphabetic()) {
            return None;
        }
        let descriptor = lines[i + 1];
        if !QTY_DESCRIPTOR.is_match(descriptor) {
            return None;
        }
        let price_line = lines[i + 2];
        if self.is_stop_line(price_line) {
            return None;
        }
        let price = CURRENCY_AMOUNT
            .captures_iter(price_line)
            .filter_map(|caps| parse_amount(&caps[1]))
            .last()?;
        Some(ItemRecord {
            name: name.to_string(),
            quantity: descriptor.to_string(),
            price,
        })
    }
}

/// Repeated OCR noise must not produce duplicate entries.
fn dedup(items: Vec<ItemRecord>) -> Vec<ItemRecord> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.dedup_key()))
        .collect()
}

/// Parse items with default settings.
pub fn parse_items(text: &str) -> Vec<ItemRecord> {
    ItemParser::new(ItemParserConfig::default()).parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_single_line_form() {
        let items = parse_items("2 x Toned Milk ₹56");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Toned Milk");
        assert_eq!(items[0].quantity, "2");
        assert_eq!(items[0].price, dec("56"));
    }

    #[test]
    fn test_three_line_form_takes_last_price() {
        let text = "Basmati Rice\n5 kg x 1\n₹499 ₹449";
        let items = parse_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Basmati Rice");
        assert_eq!(items[0].quantity, "5 kg x 1");
        assert_eq!(items[0].price, dec("449"));
    }

    #[test]
    fn test_three_line_form_count_first() {
        let text = "Paneer Cubes\n8 x 500 g\nRs. 320";
        let items = parse_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, "8 x 500 g");
        assert_eq!(items[0].price, dec("320"));
    }

    #[test]
    fn test_stop_lines_skipped() {
        let text = "Order summary\n2 x Toned Milk ₹56\nDelivery fee ₹30\nTotal ₹86";
        let items = parse_items(text);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Toned Milk");
    }

    #[test]
    fn test_duplicate_lines_deduplicated() {
        let text = "2 x Toned Milk ₹56\n2 x Toned Milk ₹56";
        let items = parse_items(text);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_same_name_different_price_kept() {
        let text = "1 x Curd ₹30\n1 x Curd ₹60";
        let items = parse_items(text);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_mixed_forms() {
        let text = "2 x Toned Milk ₹56\nBasmati Rice\n5 kg x 1\n₹449\nnoise line";
        let items = parse_items(text);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_unparseable_yields_empty() {
        assert!(parse_items("").is_empty());
        assert!(parse_items("ride receipt, nothing itemized").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let text = "2 x Toned Milk ₹56\nBasmati Rice\n5 kg x 1\n₹449";
        assert_eq!(parse_items(text), parse_items(text));
    }
}
