//! Helpers for amounts kept in minor units (piastres/cents).
//!
//! Every amount in the crate is an `i64` count of minor units so totals never drift through
//! floating-point rounding.

/// Render minor units as a two-decimal major-unit string, e.g. `12550` -> `"125.50"`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// Render an amount followed by the configured currency label.
pub fn format_with_currency(cents: i64, currency: &str) -> String {
    if currency.trim().is_empty() {
        format_cents(cents)
    } else {
        format!("{} {}", format_cents(cents), currency.trim())
    }
}

/// Parse a staff-entered major-unit amount (`"150"`, `"150.5"`, `"1,250.75"`) into minor units.
///
/// Returns `None` for anything that is not a plain non-negative decimal with at most two
/// fractional digits; callers decide whether that means zero or a validation error.
pub fn parse_cents(raw: &str) -> Option<i64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    if fraction.len() > 2
        || !whole.chars().all(|c| c.is_ascii_digit())
        || !fraction.chars().all(|c| c.is_ascii_digit())
        || (whole.is_empty() && fraction.is_empty())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().ok()?
    };
    let fraction: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minor_units() {
        assert_eq!(format_cents(12_550), "125.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(-250), "-2.50");
        assert_eq!(format_with_currency(10_000, "EGP"), "100.00 EGP");
        assert_eq!(format_with_currency(10_000, " "), "100.00");
    }

    #[test]
    fn parses_staff_input() {
        assert_eq!(parse_cents("150"), Some(15_000));
        assert_eq!(parse_cents(" 150.5 "), Some(15_050));
        assert_eq!(parse_cents("1,250.75"), Some(125_075));
        assert_eq!(parse_cents(".25"), Some(25));
    }

    #[test]
    fn rejects_garbage_input() {
        assert_eq!(parse_cents(""), None);
        assert_eq!(parse_cents("abc"), None);
        assert_eq!(parse_cents("-5"), None);
        assert_eq!(parse_cents("1.234"), None);
        assert_eq!(parse_cents("."), None);
    }
}
