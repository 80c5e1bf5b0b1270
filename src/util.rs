// Utility helpers for parsing and number formatting.
//
// This module centralizes the "dirty" CSV text handling so the rest of the
// code can assume clean, typed values.
use num_format::{Locale, ToFormattedString};

/// Parse a count cell. Counts in the published file are sometimes written
/// with thousands separators or as `12.0`, so both are accepted.
///
/// - Trims whitespace and strips `","` separators.
/// - Empty input yields `Some(0)`: the source leaves zero cells blank.
/// - Negative, fractional or non-numeric values yield `None`.
pub fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim().replace(',', "");
    if s.is_empty() {
        return Some(0);
    }
    if let Ok(v) = s.parse::<u64>() {
        return Some(v);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

/// Sum counts, clamping at `u64::MAX` instead of overflowing.
pub fn saturating_sum(values: impl IntoIterator<Item = u64>) -> u64 {
    values.into_iter().fold(0, u64::saturating_add)
}

pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i32>().ok()
}

/// Trim and collapse internal runs of whitespace: `"  Welfare   Centre "`
/// becomes `"Welfare Centre"`.
pub fn normalize_value(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison form of a categorical value: normalized and lowercased.
pub fn fold_value(raw: &str) -> String {
    normalize_value(raw).to_lowercase()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let s = format!("{:.*}", decimals, n.abs());
    let neg = n.is_sign_negative() && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// `12.34%`, or `n/a` when the value is undefined.
pub fn format_percent(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{}%", format_number(v, 2)),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_accepts_separators_and_blanks() {
        assert_eq!(parse_count("1,234"), Some(1234));
        assert_eq!(parse_count("  7 "), Some(7));
        assert_eq!(parse_count(""), Some(0));
        assert_eq!(parse_count("12.0"), Some(12));
    }

    #[test]
    fn parse_count_rejects_garbage() {
        assert_eq!(parse_count("-3"), None);
        assert_eq!(parse_count("2.5"), None);
        assert_eq!(parse_count("many"), None);
    }

    #[test]
    fn saturating_sum_clamps() {
        assert_eq!(saturating_sum([1, 2, 3]), 6);
        assert_eq!(saturating_sum([u64::MAX, 5]), u64::MAX);
        assert_eq!(saturating_sum([]), 0);
    }

    #[test]
    fn parse_year_requires_a_value() {
        assert_eq!(parse_year(" 2021"), Some(2021));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("20x1"), None);
    }

    #[test]
    fn normalize_and_fold() {
        assert_eq!(normalize_value("  Welfare   Centre "), "Welfare Centre");
        assert_eq!(fold_value(" IDP "), "idp");
    }

    #[test]
    fn format_number_inserts_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-50.0, 1), "-50.0");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(42.0, 0), "42");
    }

    #[test]
    fn format_percent_marks_undefined() {
        assert_eq!(format_percent(Some(50.0)), "50.00%");
        assert_eq!(format_percent(None), "n/a");
    }
}
