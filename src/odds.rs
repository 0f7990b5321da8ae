//! Odds and date codecs.
//!
//! The feed quotes odds as fractional strings (`"27/10"`) and dates as a
//! compact `YYYYMMDDHHMMSS` string. Both helpers are total: bad input yields
//! `None` (odds) or the input unchanged (dates).
use time::PrimitiveDateTime;
use time::macros::format_description;

/// Convert fractional odds `"n/d"` to decimal odds, `n/d + 1` rounded to
/// three places. Rounding goes through the exact decimal expansion of the
/// float, so `1/16` gives `1.062` (half to even), not `1.063`.
pub fn decimal_odds(fractional: &str) -> Option<f64> {
    let (num, den) = fractional.split_once('/')?;
    let num: i64 = num.trim().parse().ok()?;
    let den: i64 = den.trim().parse().ok()?;
    if den == 0 {
        return None;
    }
    let dec = num as f64 / den as f64 + 1.0;
    format!("{dec:.3}").parse().ok()
}

/// Render a feed date (`20250327231000`) as `2025-03-27 23:10:00`.
/// Anything that does not parse is returned as-is.
pub fn parse_feed_date(value: &str) -> String {
    if value.len() != 14 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return value.to_string();
    }
    let feed = format_description!("[year][month][day][hour][minute][second]");
    let display = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(value, feed)
        .ok()
        .and_then(|dt| dt.format(display).ok())
        .unwrap_or_else(|| value.to_string())
}
