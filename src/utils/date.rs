//! UTC datetime utilities without timezone dependencies.
//!
//! Provides a lightweight `DateTimeUtc` struct used for sheet modification
//! stamps and for human-readable build timestamps in log output.
//!
//! # Examples
//!
//! ```ignore
//! let dt = DateTimeUtc::parse("2024-06-15T14:30:45Z").unwrap();
//! assert_eq!(dt.to_unix_secs(), 1_718_461_845);
//! assert_eq!(DateTimeUtc::from_unix_secs(1_718_461_845).to_rfc3339(), "2024-06-15T14:30:45Z");
//! ```

use anyhow::{Result, bail};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTimeUtc {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    #[cfg(test)]
    pub const fn from_ymd(year: u16, month: u8, day: u8) -> Self {
        Self::new(year, month, day, 0, 0, 0)
    }

    /// Parse from "YYYY-MM-DD" or "YYYY-MM-DDTHH:MM:SS[.fff]Z" format.
    ///
    /// Fractional seconds are accepted and truncated.
    pub fn parse(s: &str) -> Option<Self> {
        let bytes = s.trim().as_bytes();

        // Minimum: "YYYY-MM-DD" (10 chars)
        if bytes.len() < 10 {
            return None;
        }

        let year = parse_u16(&bytes[0..4])?;
        if bytes[4] != b'-' {
            return None;
        }
        let month = parse_u8(&bytes[5..7])?;
        if bytes[7] != b'-' {
            return None;
        }
        let day = parse_u8(&bytes[8..10])?;

        let (hour, minute, second) = if bytes.len() == 10 {
            (0, 0, 0)
        } else if bytes.len() >= 20 && bytes[10] == b'T' && bytes[bytes.len() - 1] == b'Z' {
            if bytes[13] != b':' || bytes[16] != b':' {
                return None;
            }
            let fraction = &bytes[19..bytes.len() - 1];
            if !fraction.is_empty()
                && (fraction[0] != b'.' || !fraction[1..].iter().all(u8::is_ascii_digit))
            {
                return None;
            }
            (
                parse_u8(&bytes[11..13])?,
                parse_u8(&bytes[14..16])?,
                parse_u8(&bytes[17..19])?,
            )
        } else {
            return None;
        };

        let dt = Self::new(year, month, day, hour, minute, second);
        dt.validate().ok()?;
        Some(dt)
    }

    #[allow(clippy::trivially_copy_pass_by_ref)] // Method style is more idiomatic
    pub fn validate(&self) -> Result<()> {
        let Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        } = *self;

        if !(1..=12).contains(&month) {
            bail!("month is invalid: {month}");
        }

        let max_days = Self::days_in_month(year, month);
        if day == 0 || day > max_days {
            bail!("day is invalid: {day}");
        }
        if hour > 23 {
            bail!("hour is invalid: {hour}");
        }
        if minute > 59 {
            bail!("minute is invalid: {minute}");
        }
        if second > 59 {
            bail!("second is invalid: {second}");
        }

        Ok(())
    }

    #[inline]
    #[allow(clippy::manual_is_multiple_of)] // Manual impl for const fn
    const fn is_leap_year(year: u16) -> bool {
        year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
    }

    #[inline]
    const fn days_in_month(year: u16, month: u8) -> u8 {
        match month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 if Self::is_leap_year(year) => 29,
            2 => 28,
            _ => 0,
        }
    }

    /// Seconds since the Unix epoch. Dates before 1970 clamp to 0.
    #[allow(clippy::cast_sign_loss)] // Clamped to non-negative
    pub fn to_unix_secs(self) -> u64 {
        let days = days_from_civil(
            i64::from(self.year),
            i64::from(self.month),
            i64::from(self.day),
        );
        let secs = days * 86_400
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        secs.max(0) as u64
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn from_unix_secs(secs: u64) -> Self {
        let days = (secs / 86_400) as i64;
        let rem = secs % 86_400;
        let (year, month, day) = civil_from_days(days);
        Self::new(
            year as u16,
            month as u8,
            day as u8,
            (rem / 3600) as u8,
            ((rem / 60) % 60) as u8,
            (rem % 60) as u8,
        )
    }

    pub fn to_system_time(self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.to_unix_secs())
    }

    /// Format as RFC 3339 (ISO 8601).
    ///
    /// Returns: `YYYY-MM-DDTHH:MM:SSZ`
    pub fn to_rfc3339(self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Parse a stamp accepted by [`DateTimeUtc::parse`] into a `SystemTime`.
///
/// Fractional seconds are kept to the millisecond, rounding up, so a stamp
/// is never earlier than the moment it names.
pub fn parse_system_time(s: &str) -> Option<SystemTime> {
    let s = s.trim();
    let base = DateTimeUtc::parse(s)?.to_system_time();
    Some(base + Duration::from_millis(fraction_millis(s)))
}

/// Milliseconds in the `.fff` part of an already validated stamp.
fn fraction_millis(s: &str) -> u64 {
    let Some(digits) = s
        .get(19..s.len().saturating_sub(1))
        .and_then(|f| f.strip_prefix('.'))
    else {
        return 0;
    };

    let mut millis = 0;
    for i in 0..3 {
        let digit = digits.as_bytes().get(i).map_or(0, |b| u64::from(b - b'0'));
        millis = millis * 10 + digit;
    }
    if digits.bytes().skip(3).any(|b| b != b'0') {
        millis += 1;
    }
    millis
}

/// Format a Unix millisecond stamp for log output.
pub fn display_millis(millis: u64) -> String {
    DateTimeUtc::from_unix_secs(millis / 1000).to_rfc3339()
}

/// Milliseconds since the Unix epoch (0 for pre-epoch times).
#[allow(clippy::cast_possible_truncation)]
pub fn system_time_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// Howard Hinnant's civil calendar algorithms.
fn days_from_civil(y: i64, m: i64, d: i64) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let doy = (153 * (m + if m > 2 { -3 } else { 9 }) + 2) / 5 + d - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

fn civil_from_days(z: i64) -> (i64, i64, i64) {
    let z = z + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = yoe + era * 400 + i64::from(m <= 2);
    (y, m, d)
}

/// Parse 2-digit ASCII number
#[inline]
fn parse_u8(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = bytes[0].wrapping_sub(b'0');
    let d2 = bytes[1].wrapping_sub(b'0');
    if d1 > 9 || d2 > 9 {
        return None;
    }
    Some(d1 * 10 + d2)
}

/// Parse 4-digit ASCII number
#[inline]
fn parse_u16(bytes: &[u8]) -> Option<u16> {
    if bytes.len() != 4 {
        return None;
    }
    let mut result = 0u16;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        result = result * 10 + u16::from(d);
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_only() {
        let dt = DateTimeUtc::parse("2024-06-15").unwrap();
        assert_eq!(dt, DateTimeUtc::from_ymd(2024, 6, 15));
    }

    #[test]
    fn test_parse_with_time() {
        let dt = DateTimeUtc::parse("2024-06-15T14:30:45Z").unwrap();
        assert_eq!(dt, DateTimeUtc::new(2024, 6, 15, 14, 30, 45));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = DateTimeUtc::parse("2015-06-01T15:30:12.345Z").unwrap();
        assert_eq!(dt, DateTimeUtc::new(2015, 6, 1, 15, 30, 12));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DateTimeUtc::parse("2024-06").is_none());
        assert!(DateTimeUtc::parse("2024-13-01").is_none());
        assert!(DateTimeUtc::parse("2024-02-30").is_none());
        assert!(DateTimeUtc::parse("2024-06-15 14:30:45").is_none());
        assert!(DateTimeUtc::parse("2024-06-15T14:30:45.ab").is_none());
    }

    #[test]
    fn test_validate_leap_year() {
        assert!(DateTimeUtc::from_ymd(2024, 2, 29).validate().is_ok());
        assert!(DateTimeUtc::from_ymd(2023, 2, 29).validate().is_err());
        assert!(DateTimeUtc::from_ymd(1900, 2, 29).validate().is_err());
        assert!(DateTimeUtc::from_ymd(2000, 2, 29).validate().is_ok());
    }

    #[test]
    fn test_unix_epoch() {
        assert_eq!(DateTimeUtc::from_ymd(1970, 1, 1).to_unix_secs(), 0);
        assert_eq!(
            DateTimeUtc::from_unix_secs(0),
            DateTimeUtc::from_ymd(1970, 1, 1)
        );
    }

    #[test]
    fn test_unix_known_stamp() {
        let dt = DateTimeUtc::new(2024, 6, 15, 14, 30, 45);
        assert_eq!(dt.to_unix_secs(), 1_718_461_845);
        assert_eq!(DateTimeUtc::from_unix_secs(1_718_461_845), dt);
    }

    #[test]
    fn test_pre_epoch_clamps() {
        assert_eq!(DateTimeUtc::from_ymd(1969, 12, 31).to_unix_secs(), 0);
    }

    #[test]
    fn test_parse_system_time_keeps_fraction() {
        let base = DateTimeUtc::new(2024, 6, 15, 14, 30, 45).to_system_time();
        assert_eq!(parse_system_time("2024-06-15T14:30:45Z"), Some(base));
        assert_eq!(
            parse_system_time("2024-06-15T14:30:45.9Z"),
            Some(base + Duration::from_millis(900))
        );
        assert_eq!(
            parse_system_time("2024-06-15T14:30:45.5001Z"),
            Some(base + Duration::from_millis(501))
        );
        assert_eq!(
            parse_system_time("2024-06-15T14:30:45.999900Z"),
            Some(base + Duration::from_millis(1000))
        );
        assert_eq!(
            parse_system_time("2024-06-15"),
            Some(DateTimeUtc::from_ymd(2024, 6, 15).to_system_time())
        );
        assert_eq!(parse_system_time("2024-06-15T14:30:45.xZ"), None);
    }

    #[test]
    fn test_display_millis() {
        assert_eq!(display_millis(1_718_461_845_999), "2024-06-15T14:30:45Z");
    }
}
