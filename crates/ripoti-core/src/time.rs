//! Display helpers for East Africa Time (UTC+3, no daylight saving).
//!
//! Timestamps are always stored in UTC; these functions are only used when a
//! value is rendered for people.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};

const EAT_OFFSET_SECS: i32 = 3 * 60 * 60;

const MONTHS: [&str; 12] = [
  "Januari", "Februari", "Machi", "Aprili", "Mei", "Juni", "Julai", "Agosti",
  "Septemba", "Oktoba", "Novemba", "Desemba",
];

/// Shown in place of a timestamp that is missing.
pub const UNKNOWN_TIME: &str = "Haijulikani";

/// The fixed UTC+3 offset.
pub fn eat() -> FixedOffset {
  FixedOffset::east_opt(EAT_OFFSET_SECS).expect("UTC+3 is a valid offset")
}

/// Render `dt` as e.g. `"05 Machi 2024, 12:00:00"` in East Africa Time.
pub fn format_eat(dt: DateTime<Utc>) -> String {
  let local = dt.with_timezone(&eat());
  format!(
    "{:02} {} {}, {:02}:{:02}:{:02}",
    local.day(),
    MONTHS[local.month0() as usize],
    local.year(),
    local.hour(),
    local.minute(),
    local.second(),
  )
}

/// Like [`format_eat`], but renders a missing value as [`UNKNOWN_TIME`].
pub fn format_eat_opt(dt: Option<DateTime<Utc>>) -> String {
  dt.map(format_eat).unwrap_or_else(|| UNKNOWN_TIME.to_owned())
}

/// Time-of-day greeting for the local hour at `dt`.
pub fn greeting(dt: DateTime<Utc>) -> &'static str {
  match dt.with_timezone(&eat()).hour() {
    5..=11 => "Habari ya asubuhi",
    12..=16 => "Habari ya mchana",
    17..=20 => "Habari ya jioni",
    _ => "Habari usiku",
  }
}

/// Parse a date filter bound.
///
/// Accepts an RFC 3339 timestamp, or a bare `YYYY-MM-DD` meaning that whole
/// day in East Africa Time: its first instant, or its last when `end_of_day`.
pub fn parse_date_bound(s: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }

  let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
  let time = if end_of_day {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)?
  } else {
    NaiveTime::from_hms_opt(0, 0, 0)?
  };
  date
    .and_time(time)
    .and_local_timezone(eat())
    .single()
    .map(|dt| dt.with_timezone(&Utc))
}
