//! Fixed de-DE number formatting used by the price indicator and the build summary.

/// Rendered in place of any value that is unknown.
pub const PLACEHOLDER: &str = "–";

pub const DELTA_SUFFIX: &str = "% vs. 7-Tage-Ø";

const EURO: &str = "€";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CurrencyStyle {
    /// de-DE grouping with a non-breaking space before the symbol: `1.234,56 €`.
    #[default]
    Localized,
    /// Fallback without grouping and with an ASCII space: `1234,56 €`.
    Plain,
}

pub fn format_currency(value: f64, style: CurrencyStyle) -> String {
    let (euros, cents) = split_cents(value);
    match style {
        CurrencyStyle::Localized => format!("{},{cents}\u{a0}{EURO}", group_thousands(&euros)),
        CurrencyStyle::Plain => format!("{euros},{cents} {EURO}"),
    }
}

pub fn format_optional_currency(value: Option<f64>, style: CurrencyStyle) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format_currency(v, style))
}

/// Signed delta with a comma decimal separator, one decimal below a
/// magnitude of 10 and none above. The magnitude is taken after rounding to
/// one decimal, so 9.96 reads as `+10`.
pub fn format_delta(delta: f64) -> String {
    let digits: usize = if (delta * 10.0).round().abs() < 100.0 { 1 } else { 0 };
    let body = format!("{delta:.digits$}").replace('.', ",");
    if delta > 0.0 { format!("+{body}") } else { body }
}

pub fn format_delta_label(delta: Option<f64>) -> String {
    delta.map_or_else(
        || PLACEHOLDER.to_string(),
        |value| format!("{}{DELTA_SUFFIX}", format_delta(value)),
    )
}

/// Gauge position as a CSS length, e.g. `42.5%`.
pub fn format_gauge_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

pub fn format_trend(trend: Option<f64>) -> String {
    trend.map_or_else(
        || "-".to_string(),
        |value| {
            let normalized = if value.abs() < 0.05 { 0.0 } else { value };
            format!("{normalized:+.1}%")
        },
    )
}

pub fn format_amount(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "-".to_string(),
    }
}

/// Integer and cent digits of `value` rounded to two places. Works on the
/// decimal text so any finite magnitude keeps every digit.
fn split_cents(value: f64) -> (String, String) {
    let rounded = format!("{:.2}", if value > 0.0 { value } else { 0.0 });
    match rounded.split_once('.') {
        Some((euros, cents)) => (euros.to_string(), cents.to_string()),
        None => (rounded, "00".to_string()),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localized_currency_groups_thousands() {
        assert_eq!(format_currency(45.0, CurrencyStyle::Localized), "45,00\u{a0}€");
        assert_eq!(
            format_currency(1234.5, CurrencyStyle::Localized),
            "1.234,50\u{a0}€"
        );
        assert_eq!(
            format_currency(1_234_567.891, CurrencyStyle::Localized),
            "1.234.567,89\u{a0}€"
        );
    }

    #[test]
    fn plain_currency_differs_only_in_text() {
        let localized = format_currency(1234.5, CurrencyStyle::Localized);
        let plain = format_currency(1234.5, CurrencyStyle::Plain);
        assert_eq!(plain, "1234,50 €");
        assert_ne!(localized, plain);
        let digits = |s: &str| s.chars().filter(char::is_ascii_digit).collect::<String>();
        assert_eq!(digits(&localized), digits(&plain));
    }

    #[test]
    fn large_amounts_keep_every_digit() {
        assert_eq!(
            format_currency(1e20, CurrencyStyle::Plain),
            "100000000000000000000,00 €"
        );
        assert_eq!(
            format_currency(1e20, CurrencyStyle::Localized),
            "100.000.000.000.000.000.000,00\u{a0}€"
        );
        assert_eq!(
            format_currency(98_765_432_109.5, CurrencyStyle::Localized),
            "98.765.432.109,50\u{a0}€"
        );
    }

    #[test]
    fn currency_rounds_to_cents() {
        assert_eq!(format_currency(0.999, CurrencyStyle::Plain), "1,00 €");
        assert_eq!(format_currency(19.994, CurrencyStyle::Plain), "19,99 €");
        assert_eq!(format_currency(-0.0, CurrencyStyle::Plain), "0,00 €");
    }

    #[test]
    fn delta_precision_depends_on_magnitude() {
        assert_eq!(format_delta(-10.0), "-10");
        assert_eq!(format_delta(4.26), "+4,3");
        assert_eq!(format_delta(-3.46), "-3,5");
        assert_eq!(format_delta(23.6), "+24");
        assert_eq!(format_delta(0.0), "0,0");
    }

    #[test]
    fn delta_precision_follows_the_rounded_value() {
        assert_eq!(format_delta(9.96), "+10");
        assert_eq!(format_delta(-9.95), "-10");
        assert_eq!(format_delta(9.94), "+9,9");
        assert_eq!(format_delta(-9.949), "-9,9");
    }

    #[test]
    fn delta_label_uses_placeholder_when_unknown() {
        assert_eq!(format_delta_label(Some(-10.0)), "-10% vs. 7-Tage-Ø");
        assert_eq!(format_delta_label(None), PLACEHOLDER);
    }

    #[test]
    fn trend_and_amount_use_dash_when_missing() {
        assert_eq!(format_trend(None), "-");
        assert_eq!(format_trend(Some(0.01)), "+0.0%");
        assert_eq!(format_trend(Some(-12.34)), "-12.3%");
        assert_eq!(format_amount(Some(f64::NAN)), "-");
        assert_eq!(format_amount(Some(3.5)), "3.50");
    }
}
