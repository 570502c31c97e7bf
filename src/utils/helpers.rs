//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use rust_decimal::Decimal;

/// Format an amount with two decimal places and a currency sign
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Sum a list of prices, rounded to cents
pub fn sum_prices<I>(prices: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    prices.into_iter().fold(Decimal::ZERO, |acc, p| acc + p).round_dp(2)
}

/// Normalize free text coming from a form field.
///
/// Strips control characters, collapses internal whitespace and trims.
pub fn sanitize_text(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a product-to-course binding of the form `"<course_id>:<version>"`.
///
/// The version part is optional; `default_version` is used when it is
/// missing or not a positive integer.
pub fn parse_course_binding(binding: &str, default_version: i32) -> Option<(i64, i32)> {
    let mut parts = binding.trim().splitn(2, ':');
    let course_id = parts.next()?.trim().parse::<i64>().ok().filter(|id| *id > 0)?;
    let version = parts
        .next()
        .and_then(|v| v.trim().parse::<i32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_version);

    Some((course_id, version))
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_course_binding() {
        assert_eq!(parse_course_binding("42:3", 1), Some((42, 3)));
        assert_eq!(parse_course_binding("42", 1), Some((42, 1)));
        assert_eq!(parse_course_binding(" 42 : 2 ", 1), Some((42, 2)));
        assert_eq!(parse_course_binding("42:abc", 1), Some((42, 1)));
        assert_eq!(parse_course_binding("42:0", 5), Some((42, 5)));
        assert_eq!(parse_course_binding("abc:2", 1), None);
        assert_eq!(parse_course_binding("", 1), None);
        assert_eq!(parse_course_binding("-3:1", 1), None);
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  Acme   Corp \n"), "Acme Corp");
        assert_eq!(sanitize_text("a\tb\u{0007}c"), "a b c");
        assert_eq!(sanitize_text("   "), "");
    }

    #[test]
    fn test_sum_prices_and_format() {
        let total = sum_prices(vec![dec!(100.00), dec!(50.00), dec!(0.005)]);
        assert_eq!(total, dec!(150.00));
        assert_eq!(format_money(dec!(75)), "$75.00");
        assert_eq!(format_money(dec!(12.345)), "$12.34");
        assert_eq!(sum_prices(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a very long course title", 10), "a very ...");
    }
}
