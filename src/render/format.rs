//! Number formatting for chart labels and tables.

use format_num::format_num;

/// Formats `value` with two significant digits and an SI prefix, e.g. `2500.0` becomes `2.5k`,
/// `999.0` becomes `1.0k` and `0.5` becomes `500m`.
pub fn abbreviate(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    format_num!(".2s", value)
}

/// A statistic for the statistics table: two decimals with thousands separators, or a dash when
/// the value is undefined.
pub fn stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format_num!(",.2", v),
        _ => "—".to_string(),
    }
}
