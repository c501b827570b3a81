//! Generative extraction: instruction building and response parsing.
//!
//! The JSON exchanged with the model is an internal contract, not a
//! public interface, and the producing model is not schema-constrained;
//! parsing is deliberately lenient about field spellings and numeric
//! strings, and strict about the one thing that matters: a numeric
//! total must be present before the response is trusted.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::receipt::{GenerativeExtraction, ItemRecord, OrderCategory};

const ITEMIZED_INSTRUCTION: &str = "You are reading a photographed grocery order receipt. \
Reply with JSON only: {\"total_amount\": <number>, \"items\": [{\"name\": <string>, \
\"quantity\": <string>, \"price\": <number>}]}. Copy the grand total exactly as shown; \
do not round or estimate. Skip delivery, handling, and platform fees. Keep quantity \
text verbatim, units included. If the total is not readable, reply \
{\"error\": \"<reason>\"} instead of guessing.";

const SINGLE_AMOUNT_INSTRUCTION: &str = "You are reading a photographed payment receipt. \
Reply with JSON only: {\"total_amount\": <number>}. Copy the amount paid exactly as \
shown; do not round or estimate. If the amount is not readable, reply \
{\"error\": \"<reason>\"} instead of guessing.";

/// The fixed instruction template for a category.
pub fn instruction_for(category: OrderCategory) -> &'static str {
    match category {
        OrderCategory::Itemized => ITEMIZED_INSTRUCTION,
        OrderCategory::SingleAmount => SINGLE_AMOUNT_INSTRUCTION,
    }
}

/// Strip a markdown code-fence wrapper, if present.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    body = body.trim();
    if let Some(rest) = body.strip_suffix("```") {
        body = rest.trim_end();
    }
    body
}

/// Parse and schema-check a raw model response.
///
/// Fails on an explicit error field, malformed JSON, or a missing
/// numeric total. These failures are deterministic; callers fall back
/// instead of retrying.
pub fn parse_response(raw: &str) -> Result<GenerativeExtraction, ExtractionError> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::GenerativeFailed(format!("malformed response: {e}")))?;

    if let Some(err) = value.get("error").filter(|v| !v.is_null()) {
        let reason = err.as_str().unwrap_or("unspecified").to_string();
        return Err(ExtractionError::GenerativeFailed(format!(
            "model reported: {reason}"
        )));
    }

    let total_amount = value
        .get("total_amount")
        .or_else(|| value.get("totalAmount"))
        .and_then(decimal_field)
        .ok_or_else(|| {
            ExtractionError::GenerativeFailed("response lacks a numeric total_amount".to_string())
        })?;

    let items: Vec<ItemRecord> = value
        .get("items")
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(item_field).collect())
        .unwrap_or_default();

    debug!(
        "model extracted total {} with {} item(s)",
        total_amount,
        items.len()
    );
    Ok(GenerativeExtraction { total_amount, items })
}

/// Accept JSON numbers and numeric strings ("₹484.00" included).
fn decimal_field(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            Decimal::from_str(&cleaned).ok()
        }
        _ => None,
    }
}

fn item_field(value: &Value) -> Option<ItemRecord> {
    let name = value.get("name")?.as_str()?.trim().to_string();
    if name.is_empty() {
        return None;
    }
    let quantity = match value.get("quantity") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "1".to_string(),
    };
    let price = value.get("price").and_then(decimal_field)?;
    Some(ItemRecord {
        name,
        quantity,
        price,
    })
}
