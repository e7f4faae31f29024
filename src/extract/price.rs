//! Price text normalization. Prices are kept as text.

use crate::constants::CURRENCY_TOKENS;

/// Collapses runs of whitespace (including no-break spaces) into single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips currency tokens and surrounding whitespace. Returns `None` when nothing
/// is left.
pub fn normalize_price_text(text: &str) -> Option<String> {
    let mut cleaned = text.to_string();
    for token in CURRENCY_TOKENS {
        cleaned = cleaned.replace(token, "");
    }
    let cleaned = collapse_whitespace(&cleaned);
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Joins an integer part and a superscript fraction: `("12", "50")` → `"12.50"`.
/// A trailing separator on the integer part is dropped first.
pub fn join_fraction(integer: &str, fraction: Option<&str>) -> Option<String> {
    let integer = normalize_price_text(integer);
    let fraction = fraction.and_then(normalize_price_text);
    match (integer, fraction) {
        (Some(int), Some(frac)) => {
            let int = int.trim_end_matches(&['.', ','][..]).trim_end();
            if int.is_empty() {
                Some(frac)
            } else {
                Some(format!("{int}.{frac}"))
            }
        }
        (Some(int), None) => Some(int),
        (None, Some(frac)) => Some(frac),
        (None, None) => None,
    }
}
