//! Duration string codec.
//!
//! The detection file format encodes timestamps as signed
//! `[days, ]H:MM:SS[.ffffff]` strings with microsecond precision.
//! The grammar accepted by [`parse_duration`] is:
//!
//! ```text
//! (<days> (days?, )?)? [-]? (<hours>:)? (<minutes>:)? <seconds> (.<fraction, up to 6 digits>)?
//! ```
//!
//! The days component carries its own optional sign; a `-` in front of the
//! clock part negates only the H:M:S portion, and the two are summed.
//! [`format_duration`] renders negative values with a negative days count
//! and a positive clock remainder, so its output always reads back through
//! the parser's days-plus-clock sum to the exact same microsecond value.

use chrono::TimeDelta;

use crate::error::{ModelError, ModelResult};

const MICROS_PER_SECOND: i64 = 1_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Convert a duration to fractional seconds.
pub fn to_seconds(value: &TimeDelta) -> f64 {
    match value.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_SECOND as f64,
        // Out of microsecond range; fall back to whole seconds.
        None => value.num_seconds() as f64,
    }
}

/// Total signed microseconds in a duration.
fn total_micros(value: &TimeDelta) -> i64 {
    value.num_seconds() * MICROS_PER_SECOND + (value.subsec_nanos() / 1_000) as i64
}

/// Parse a duration string.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use weirwatch_models::duration::parse_duration;
///
/// assert_eq!(parse_duration("0:00:02").unwrap(), TimeDelta::seconds(2));
/// assert_eq!(parse_duration("1 day, 0:00:00").unwrap(), TimeDelta::days(1));
/// assert_eq!(
///     parse_duration("0:00:05.250000").unwrap(),
///     TimeDelta::milliseconds(5250)
/// );
/// ```
pub fn parse_duration(value: &str) -> ModelResult<TimeDelta> {
    let bad = || ModelError::DurationFormat(value.to_string());
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad());
    }

    // Optional leading "<days> " or "<days> days, " component.
    let (days, clock) = match trimmed.split_once(' ') {
        Some((first, rest)) if first.parse::<i64>().is_ok() => {
            let days: i64 = first.parse().map_err(|_| bad())?;
            let rest = rest
                .strip_prefix("days, ")
                .or_else(|| rest.strip_prefix("day, "))
                .unwrap_or(rest);
            (days, rest)
        }
        Some(_) => return Err(bad()),
        None => (0, trimmed),
    };

    // Sign on the clock portion only; days carry their own sign.
    let (sign, clock) = match clock.strip_prefix('-') {
        Some(rest) => (-1i64, rest),
        None => (1i64, clock),
    };

    let mut parts = clock.split(':').collect::<Vec<_>>();
    if parts.is_empty() || parts.len() > 3 {
        return Err(bad());
    }

    // Last field is seconds, possibly with a fraction.
    let seconds_part = parts.pop().ok_or_else(bad)?;
    let (whole, fraction) = match seconds_part.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (seconds_part, None),
    };
    let seconds = parse_field(whole).ok_or_else(bad)?;
    let micros_frac = match fraction {
        Some(f) => parse_fraction(f).ok_or_else(bad)?,
        None => 0,
    };

    let minutes = match parts.pop() {
        Some(m) => parse_field(m).ok_or_else(bad)?,
        None => 0,
    };
    let hours = match parts.pop() {
        Some(h) => parse_field(h).ok_or_else(bad)?,
        None => 0,
    };

    let clock_micros = ((hours * 3600 + minutes * 60 + seconds) * MICROS_PER_SECOND) + micros_frac;
    let total = days * SECONDS_PER_DAY * MICROS_PER_SECOND + sign * clock_micros;
    Ok(TimeDelta::microseconds(total))
}

/// Parse an unsigned decimal field (hours, minutes or whole seconds).
fn parse_field(field: &str) -> Option<i64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Parse a fractional-seconds field into microseconds.
///
/// Up to six digits are significant; anything past microsecond precision
/// is discarded, matching the serializer's fixed six-digit output.
fn parse_fraction(fraction: &str) -> Option<i64> {
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits: String = fraction.chars().take(6).collect();
    let padded = format!("{:0<6}", digits);
    padded.parse().ok()
}

/// Serialize a duration to the detection-file string form.
///
/// Negative values render as a negative days count plus a positive clock
/// remainder, the way Python's `timedelta` prints, because that is the
/// composition the parser applies when reading the string back. A
/// fractional part is included only when non-zero, always zero-padded to
/// six digits so the parser reads back the exact microsecond count.
///
/// # Examples
/// ```
/// use chrono::TimeDelta;
/// use weirwatch_models::duration::format_duration;
///
/// assert_eq!(format_duration(&TimeDelta::seconds(2)), "0:00:02");
/// assert_eq!(format_duration(&TimeDelta::days(1)), "1 day, 0:00:00");
/// assert_eq!(format_duration(&TimeDelta::milliseconds(-5250)), "-1 day, 23:59:54.750000");
/// ```
pub fn format_duration(value: &TimeDelta) -> String {
    let total = total_micros(value);
    let day_micros = SECONDS_PER_DAY * MICROS_PER_SECOND;
    let days = total.div_euclid(day_micros);
    let remainder = total.rem_euclid(day_micros) as u64;

    let micros = remainder % MICROS_PER_SECOND as u64;
    let total_seconds = remainder / MICROS_PER_SECOND as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    let mut out = String::new();
    if days != 0 {
        let unit = if days.abs() == 1 { "day" } else { "days" };
        out.push_str(&format!("{} {}, ", days, unit));
    }
    out.push_str(&format!("{}:{:02}:{:02}", hours, minutes, seconds));
    if micros > 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}

/// Serde adapter encoding a [`TimeDelta`] as a duration string.
pub mod serde_str {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_duration, parse_duration};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_clock() {
        assert_eq!(parse_duration("0:00:00").unwrap(), TimeDelta::zero());
        assert_eq!(parse_duration("0:00:02").unwrap(), TimeDelta::seconds(2));
        assert_eq!(parse_duration("1:02:03").unwrap(), TimeDelta::seconds(3723));
        assert_eq!(parse_duration("75").unwrap(), TimeDelta::seconds(75));
        assert_eq!(parse_duration("2:05").unwrap(), TimeDelta::seconds(125));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        assert_eq!(
            parse_duration("0:00:05.25").unwrap(),
            TimeDelta::milliseconds(5250)
        );
        assert_eq!(
            parse_duration("0:00:00.000001").unwrap(),
            TimeDelta::microseconds(1)
        );
        // Digits past microsecond precision are discarded
        assert_eq!(
            parse_duration("0:00:00.1234567").unwrap(),
            TimeDelta::microseconds(123_456)
        );
    }

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_duration("1 day, 0:00:00").unwrap(), TimeDelta::days(1));
        assert_eq!(
            parse_duration("2 days, 1:00:00").unwrap(),
            TimeDelta::hours(49)
        );
        assert_eq!(
            parse_duration("-1 days, 23:59:59").unwrap(),
            TimeDelta::seconds(-1)
        );
    }

    #[test]
    fn test_parse_negative_clock() {
        assert_eq!(parse_duration("-0:00:02").unwrap(), TimeDelta::seconds(-2));
        assert_eq!(
            parse_duration("-0:00:05.250000").unwrap(),
            TimeDelta::milliseconds(-5250)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "  ", "abc", "1:2:3:4", "0:xx:00", "0:00:00.", "5 fish, 0:00:00"] {
            assert!(
                matches!(parse_duration(bad), Err(ModelError::DurationFormat(_))),
                "expected failure for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format() {
        assert_eq!(format_duration(&TimeDelta::zero()), "0:00:00");
        assert_eq!(format_duration(&TimeDelta::seconds(3723)), "1:02:03");
        assert_eq!(format_duration(&TimeDelta::days(1)), "1 day, 0:00:00");
        assert_eq!(format_duration(&TimeDelta::hours(49)), "2 days, 1:00:00");
        assert_eq!(
            format_duration(&TimeDelta::microseconds(5_250_000)),
            "0:00:05.250000"
        );
    }

    #[test]
    fn test_format_negative_normalizes_days() {
        // Negative days, positive clock remainder; the parser sums the two
        assert_eq!(format_duration(&TimeDelta::seconds(-2)), "-1 day, 23:59:58");
        assert_eq!(
            format_duration(&TimeDelta::milliseconds(-5250)),
            "-1 day, 23:59:54.750000"
        );
        assert_eq!(format_duration(&TimeDelta::days(-1)), "-1 day, 0:00:00");
        let composite = TimeDelta::microseconds(-(2 * 86_400_000_000 + 3_600_000_000 + 42));
        assert_eq!(format_duration(&composite), "-3 days, 22:59:59.999958");
        assert_eq!(parse_duration("-3 days, 22:59:59.999958").unwrap(), composite);
    }

    #[test]
    fn test_round_trip_microsecond_precision() {
        let samples = [
            0i64,
            1,
            -1,
            999_999,
            5_250_000,
            -5_250_000,
            86_400_000_000,
            -86_400_000_000,
            90_061_000_000 + 123_456,
            -(2 * 86_400_000_000 + 3_600_000_000 + 42),
        ];
        for micros in samples {
            let original = TimeDelta::microseconds(micros);
            let encoded = format_duration(&original);
            let decoded = parse_duration(&encoded).unwrap();
            assert_eq!(decoded, original, "round trip failed for {:?}", encoded);
        }
    }

    #[test]
    fn test_to_seconds() {
        assert_eq!(to_seconds(&TimeDelta::seconds(2)), 2.0);
        assert!((to_seconds(&TimeDelta::milliseconds(1500)) - 1.5).abs() < 1e-9);
        assert_eq!(to_seconds(&TimeDelta::seconds(-3)), -3.0);
    }
}
