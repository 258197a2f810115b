//! Presentation formatting for report values
//!
//! Numbers stay numeric throughout the pipeline; these helpers only run when
//! a table is rendered for people. CSV exports use plain numbers instead.

use super::scoring::round2;

/// Format dollars with thousands separators and cents.
///
/// # Examples
///
/// ```
/// use commcalc_common::report::format::format_currency;
///
/// assert_eq!(format_currency(1476.0), "$1,476.00");
/// assert_eq!(format_currency(1234567.891), "$1,234,567.89");
/// assert_eq!(format_currency(-42.5), "-$42.50");
/// assert_eq!(format_currency(0.0), "$0.00");
/// ```
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let remainder = cents % 100;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, group_thousands(dollars), remainder)
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

/// Format a percentage value (already scaled to 0–100).
///
/// ```
/// use commcalc_common::report::format::format_percent;
///
/// assert_eq!(format_percent(56.0), "56.00%");
/// assert_eq!(format_percent(33.3333), "33.33%");
/// ```
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Format a count: whole numbers without decimals, otherwise up to 2 places.
///
/// ```
/// use commcalc_common::report::format::format_count;
///
/// assert_eq!(format_count(12.0), "12");
/// assert_eq!(format_count(1.5), "1.5");
/// assert_eq!(format_count(2.0 / 3.0), "0.67");
/// ```
pub fn format_count(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format!("{}", round2(value))
}
