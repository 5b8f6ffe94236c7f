//! Time-unit and formatted-size normalization
//!
//! Cassandra exposes latency units in several spellings depending on the
//! release and on which attribute is read: `LatencyUnit` / `DurationUnit`
//! carry a `java.util.concurrent.TimeUnit` name (`MICROSECONDS`), while
//! `RateUnit` is a decorated string (`events/second`, `PER_SECOND`). Storage
//! sizes may come back as raw byte counts or as `"12.5 MB"` strings.

use std::fmt;
use std::str::FromStr;

use crate::utils::ParseError;

/// Canonical time unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
    ];

    /// Upper-case plural name, matching the JMX enum constant
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }

    /// Match a bare root such as `SECOND`, `seconds` or `us`
    fn from_root(root: &str) -> Option<Self> {
        let unit = match root {
            "NANOSECOND" | "NANOSECONDS" | "NS" => TimeUnit::Nanoseconds,
            "MICROSECOND" | "MICROSECONDS" | "US" => TimeUnit::Microseconds,
            "MILLISECOND" | "MILLISECONDS" | "MS" => TimeUnit::Milliseconds,
            "SECOND" | "SECONDS" | "S" => TimeUnit::Seconds,
            "MINUTE" | "MINUTES" | "MIN" => TimeUnit::Minutes,
            "HOUR" | "HOURS" | "H" => TimeUnit::Hours,
            "DAY" | "DAYS" | "D" => TimeUnit::Days,
            _ => return None,
        };
        Some(unit)
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse of a JMX `TimeUnit` constant name (case-insensitive)
impl FromStr for TimeUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        TimeUnit::ALL
            .iter()
            .copied()
            .find(|unit| unit.as_str() == upper)
            .ok_or_else(|| ParseError::TimeUnit(s.to_string()))
    }
}

/// Scale `value` expressed in `unit` to milliseconds
pub fn to_millis(value: f64, unit: TimeUnit) -> f64 {
    match unit {
        TimeUnit::Nanoseconds => value / 1_000_000.0,
        TimeUnit::Microseconds => value / 1_000.0,
        TimeUnit::Milliseconds => value,
        TimeUnit::Seconds => value * 1_000.0,
        TimeUnit::Minutes => value * 60_000.0,
        TimeUnit::Hours => value * 3_600_000.0,
        TimeUnit::Days => value * 86_400_000.0,
    }
}

/// Reduce a decorated rate or latency unit string to its time unit
///
/// Accepts `PER_SECOND`, `events/second`, `calls/minute`, `per hour`,
/// `MICROSECONDS` and similar. Qualifiers are stripped and the root is kept.
pub fn clean_units_string(raw: &str) -> Result<TimeUnit, ParseError> {
    let upper = raw.trim().to_ascii_uppercase();
    let tail = upper.rsplit('/').next().unwrap_or(&upper).trim();
    let root = tail
        .strip_prefix("PER_")
        .or_else(|| tail.strip_prefix("PER "))
        .unwrap_or(tail)
        .trim();

    TimeUnit::from_root(root).ok_or_else(|| ParseError::TimeUnit(raw.to_string()))
}

/// Parse a human-readable size such as `"12.5 MB"` into bytes
///
/// Suffixes are binary multiples (1 KB = 1024 bytes), matching how Cassandra
/// formats `LoadString`. Both `KB` and `KiB` spellings are accepted, case
/// does not matter and whitespace between number and suffix is optional.
/// A bare number is taken as bytes.
///
/// Commas are thousands separators when the leading group has one to three
/// digits and every later group exactly three (`"1,024 KB"`,
/// `"1,024,000 bytes"`). Otherwise a single comma with no dot is a decimal
/// comma (`"1,5 KB"`). Any other comma placement is rejected.
pub fn parse_formatted_size(raw: &str) -> Result<f64, ParseError> {
    let s = raw.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
        .unwrap_or(s.len());
    let (number, suffix) = s.split_at(split);

    let number = number.trim();
    if number.is_empty() {
        return Err(ParseError::Size(raw.to_string()));
    }
    let number = normalize_separators(number).ok_or_else(|| ParseError::Size(raw.to_string()))?;
    let magnitude: f64 = number
        .parse()
        .map_err(|_| ParseError::Size(raw.to_string()))?;

    let multiplier = size_multiplier(suffix.trim()).ok_or_else(|| ParseError::Size(raw.to_string()))?;
    Ok(magnitude * multiplier)
}

/// Strip thousands separators or turn a decimal comma into a dot
fn normalize_separators(number: &str) -> Option<String> {
    if !number.contains(',') {
        return Some(number.to_string());
    }
    let (integer, fraction) = match number.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (number, None),
    };
    let groups: Vec<&str> = integer.split(',').collect();
    let leading = groups[0].trim_start_matches(['-', '+']);
    let grouped = (1..=3).contains(&leading.len()) && groups[1..].iter().all(|g| g.len() == 3);
    if grouped {
        let digits = groups.concat();
        return Some(match fraction {
            Some(fraction) => format!("{}.{}", digits, fraction),
            None => digits,
        });
    }
    match (groups.as_slice(), fraction) {
        ([whole, decimals], None) if !decimals.is_empty() => Some(format!("{}.{}", whole, decimals)),
        _ => None,
    }
}

fn size_multiplier(suffix: &str) -> Option<f64> {
    const KIB: f64 = 1024.0;
    let exponent = match suffix.to_ascii_uppercase().as_str() {
        "" | "B" | "BYTE" | "BYTES" => 0,
        "K" | "KB" | "KIB" => 1,
        "M" | "MB" | "MIB" => 2,
        "G" | "GB" | "GIB" => 3,
        "T" | "TB" | "TIB" => 4,
        "P" | "PB" | "PIB" => 5,
        _ => return None,
    };
    Some(KIB.powi(exponent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_millis_scaling() {
        for x in [0.0, 1.0, 2.5, 1234.5678, -3.0] {
            assert_eq!(to_millis(x, TimeUnit::Seconds), x * 1000.0);
            assert_eq!(to_millis(x, TimeUnit::Nanoseconds), x / 1_000_000.0);
            assert_eq!(to_millis(x, TimeUnit::Milliseconds), x);
        }
        assert_eq!(to_millis(1500.0, TimeUnit::Microseconds), 1.5);
        assert_eq!(to_millis(2.0, TimeUnit::Minutes), 120_000.0);
        assert_eq!(to_millis(1.0, TimeUnit::Hours), 3_600_000.0);
        assert_eq!(to_millis(1.0, TimeUnit::Days), 86_400_000.0);
    }

    #[test]
    fn test_clean_units_string() {
        assert_eq!(clean_units_string("PER_SECOND"), Ok(TimeUnit::Seconds));
        assert_eq!(clean_units_string("events/second"), Ok(TimeUnit::Seconds));
        assert_eq!(clean_units_string("calls/minute"), Ok(TimeUnit::Minutes));
        assert_eq!(clean_units_string("per hour"), Ok(TimeUnit::Hours));
        assert_eq!(clean_units_string("MICROSECONDS"), Ok(TimeUnit::Microseconds));
        assert_eq!(clean_units_string(" per_millisecond "), Ok(TimeUnit::Milliseconds));
        assert!(clean_units_string("furlongs").is_err());
        assert!(clean_units_string("").is_err());
    }

    #[test]
    fn test_clean_units_string_idempotent() {
        for raw in ["PER_SECOND", "events/minute", "NANOSECONDS", "per day"] {
            let once = clean_units_string(raw).unwrap();
            let twice = clean_units_string(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
        for unit in TimeUnit::ALL {
            assert_eq!(clean_units_string(unit.as_str()), Ok(unit));
        }
    }

    #[test]
    fn test_time_unit_from_str_is_strict() {
        assert_eq!("microseconds".parse::<TimeUnit>(), Ok(TimeUnit::Microseconds));
        assert_eq!("SECONDS".parse::<TimeUnit>(), Ok(TimeUnit::Seconds));
        assert!("events/second".parse::<TimeUnit>().is_err());
        assert!("PER_SECOND".parse::<TimeUnit>().is_err());
    }

    #[test]
    fn test_parse_formatted_size() {
        assert_eq!(parse_formatted_size("12.5 MB"), Ok(12.5 * 1024.0 * 1024.0));
        assert_eq!(parse_formatted_size("5 GB"), Ok(5.0 * 1024.0 * 1024.0 * 1024.0));
        assert_eq!(parse_formatted_size("512 bytes"), Ok(512.0));
        assert_eq!(parse_formatted_size("  1.5kb "), Ok(1536.0));
        assert_eq!(parse_formatted_size("2 KiB"), Ok(2048.0));
        assert_eq!(parse_formatted_size("1 TB"), Ok(1024f64.powi(4)));
        assert_eq!(parse_formatted_size("1,5 KB"), Ok(1536.0));
        assert_eq!(parse_formatted_size("1,024.5 bytes"), Ok(1024.5));
        assert_eq!(parse_formatted_size("1,024 KB"), Ok(1024.0 * 1024.0));
        assert_eq!(parse_formatted_size("1,024,000 bytes"), Ok(1_024_000.0));
        assert_eq!(parse_formatted_size("0,25 MB"), Ok(0.25 * 1024.0 * 1024.0));
        assert_eq!(parse_formatted_size("300"), Ok(300.0));
    }

    #[test]
    fn test_parse_formatted_size_rejects_malformed() {
        assert_eq!(parse_formatted_size("bad"), Err(ParseError::Size("bad".to_string())));
        assert!(parse_formatted_size("").is_err());
        assert!(parse_formatted_size("12 parsecs").is_err());
        assert!(parse_formatted_size("1.2.3 MB").is_err());
        assert!(parse_formatted_size("MB").is_err());
        assert!(parse_formatted_size("1,5,3 KB").is_err());
        assert!(parse_formatted_size("12,34.5 MB").is_err());
        assert!(parse_formatted_size(", KB").is_err());
    }
}
