//! Regex patterns shared by the receipt scanners.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency-marked amount: ₹1,234.56 / Rs. 250 / INR 94.
    // Comma grouping is accepted loosely so lakh-style figures parse.
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"(?i)(?:₹|\bRs\.?|\bINR)\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)"
    ).unwrap();

    // Bare numeric token for the context pass: 1-5 digits, optional
    // 2-digit fraction. Surrounding characters are checked separately.
    pub static ref BARE_NUMBER: Regex = Regex::new(
        r"[0-9]{1,5}(?:\.[0-9]{2})?"
    ).unwrap();

    // Bare numeric token for the validation fallback: 2-5 digits.
    pub static ref VALIDATION_NUMBER: Regex = Regex::new(
        r"\b[0-9]{2,5}(?:\.[0-9]{1,2})?\b"
    ).unwrap();

    // A month name anywhere on a line marks it as a date line.
    pub static ref MONTH_NAME: Regex = Regex::new(
        r"(?i)\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|jun(?:e)?|jul(?:y)?|aug(?:ust)?|sep(?:t|tember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b"
    ).unwrap();

    // Clock meridiem directly after a number ("7 pm").
    pub static ref MERIDIEM: Regex = Regex::new(
        r"(?i)^\s*(?:am|pm)\b"
    ).unwrap();

    // Distance unit directly after a number ("2.3 km", "450 m").
    pub static ref DISTANCE_UNIT: Regex = Regex::new(
        r"(?i)^\s*(?:km|meters?|mtr|m)\b"
    ).unwrap();

    // Single-line item form: `<qty> x <name> <currency><price>`.
    pub static ref SINGLE_LINE_ITEM: Regex = Regex::new(
        r"(?i)^([0-9]+)\s*[x×]\s+(.+?)\s+(?:₹|\bRs\.?|\bINR)\s*([0-9][0-9,]*(?:\.[0-9]{1,2})?)\s*$"
    ).unwrap();

    // Quantity descriptor line: `<amount><unit> x <count>` or the reverse.
    pub static ref QTY_DESCRIPTOR: Regex = Regex::new(
        r"(?i)^(?:[0-9]+(?:\.[0-9]+)?\s*(?:g|gm|gms|kg|ml|l|ltr|pc|pcs|pack|packs|pieces?|units?)\s*[x×]\s*[0-9]+|[0-9]+\s*[x×]\s*[0-9]+(?:\.[0-9]+)?\s*(?:g|gm|gms|kg|ml|l|ltr|pc|pcs|pack|packs|pieces?|units?))\s*$"
    ).unwrap();
}
