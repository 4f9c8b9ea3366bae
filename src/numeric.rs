//! Lenient number parsing for values read from page attributes and content files.
//!
//! Every parser returns `None` instead of failing: an unusable value only ever
//! makes its own field unknown.

use serde_json::Value;

/// Parses a monetary amount. Accepts `.` or `,` as decimal separator.
/// Rejects NaN, infinities and negative amounts.
pub fn parse_money(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| decimal_comma(trimmed)?.parse::<f64>().ok())?;
    money(parsed)
}

/// Accepts a finite, non-negative amount.
pub fn money(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Reads a monetary amount from a JSON number or numeric string.
pub fn money_from_json(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().and_then(money),
        Value::String(text) => parse_money(text),
        _ => None,
    }
}

/// Reads a leading non-negative integer, ignoring any trailing text:
/// `"10+"` gives 10 and `"3 Spieler"` gives 3.
pub fn parse_count(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(unsigned.len(), |(idx, _)| idx);
    if digits_end == 0 {
        return None;
    }
    unsigned[..digits_end].parse().ok()
}

fn decimal_comma(raw: &str) -> Option<String> {
    if raw.matches(',').count() != 1 || raw.contains('.') {
        return None;
    }
    Some(raw.replace(',', "."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn money_accepts_dot_and_comma() {
        assert_eq!(parse_money("45.00"), Some(45.0));
        assert_eq!(parse_money(" 19,99 "), Some(19.99));
    }

    #[test]
    fn money_rejects_garbage_and_non_finite() {
        assert_eq!(parse_money("abc"), None);
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("NaN"), None);
        assert_eq!(parse_money("inf"), None);
        assert_eq!(parse_money("-3"), None);
        assert_eq!(parse_money("1,234.5"), None);
    }

    #[test]
    fn money_from_json_reads_numbers_and_strings() {
        assert_eq!(money_from_json(&json!(12.5)), Some(12.5));
        assert_eq!(money_from_json(&json!("12.5")), Some(12.5));
        assert_eq!(money_from_json(&json!(null)), None);
        assert_eq!(money_from_json(&json!([1])), None);
    }

    #[test]
    fn count_reads_leading_digits() {
        assert_eq!(parse_count("10+"), Some(10));
        assert_eq!(parse_count("3 Spieler"), Some(3));
        assert_eq!(parse_count("+4"), Some(4));
        assert_eq!(parse_count("ab 10"), None);
        assert_eq!(parse_count("-2"), None);
        assert_eq!(parse_count(""), None);
    }
}
