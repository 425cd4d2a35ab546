// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::value::traits::*;
use crate::value::{EvalError, Value};

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;

const NANOS_PER_SECOND: i128 = 1_000_000_000;
// Roughly +-10000 years, the range of google.protobuf.Duration.
const MAX_DURATION_SECONDS: i128 = 315_576_000_000;
// 0001-01-01T00:00:00Z
const MIN_TIMESTAMP_SECONDS: i128 = -62_135_596_800;
// 9999-12-31T23:59:59Z
const MAX_TIMESTAMP_SECONDS: i128 = 253_402_300_799;

/// Signed span of time with nanosecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    nanos: i128,
}

/// Instant in UTC with nanosecond precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    nanos: i128,
}

impl Duration {
    pub fn from_nanos(nanos: i128) -> Result<Self, EvalError> {
        if nanos.abs() >= (MAX_DURATION_SECONDS + 1) * NANOS_PER_SECOND {
            return Err(EvalError::DurationOverflow);
        }
        Ok(Self { nanos })
    }

    pub fn new(seconds: i64, nanos: i32) -> Result<Self, EvalError> {
        Self::from_nanos(seconds as i128 * NANOS_PER_SECOND + nanos as i128)
    }

    pub fn total_nanos(&self) -> i128 {
        self.nanos
    }

    /// Whole seconds, truncated toward zero.
    pub fn seconds(&self) -> i64 {
        (self.nanos / NANOS_PER_SECOND) as i64
    }

    pub fn subsec_nanos(&self) -> i32 {
        (self.nanos % NANOS_PER_SECOND) as i32
    }

    /// Parses a sequence of decimal numbers with unit suffixes such as
    /// `1h30m`, `-1.5s` or `300ms`. Valid units are `h`, `m`, `s`, `ms`,
    /// `us` (or `µs`) and `ns`.
    pub fn parse(text: &str) -> Result<Self, EvalError> {
        let invalid = || EvalError::conversion(format!("invalid duration format: '{text}'"));
        let (negative, mut rest) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        if rest == "0" {
            return Ok(Self::default());
        }
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut total: i128 = 0;
        while !rest.is_empty() {
            let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            let int_part = &rest[..int_len];
            rest = &rest[int_len..];

            let mut frac_part = "";
            if let Some(r) = rest.strip_prefix('.') {
                let frac_len = r.bytes().take_while(u8::is_ascii_digit).count();
                frac_part = &r[..frac_len];
                rest = &r[frac_len..];
            }
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(invalid());
            }

            let unit_len = rest
                .char_indices()
                .find(|(_, c)| !(c.is_alphabetic()))
                .map_or(rest.len(), |(i, _)| i);
            let unit = match &rest[..unit_len] {
                "ns" => 1,
                "us" | "µs" | "μs" => 1_000,
                "ms" => 1_000_000,
                "s" => NANOS_PER_SECOND,
                "m" => 60 * NANOS_PER_SECOND,
                "h" => 3600 * NANOS_PER_SECOND,
                _ => return Err(invalid()),
            };
            rest = &rest[unit_len..];

            let whole: i128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| EvalError::DurationOverflow)?
            };
            let mut value = whole.checked_mul(unit).ok_or(EvalError::DurationOverflow)?;

            // Only as many fractional digits as can affect the result.
            let frac_part = &frac_part[..frac_part.len().min(18)];
            if !frac_part.is_empty() {
                let frac: i128 = frac_part.parse().map_err(|_| invalid())?;
                let scale = 10i128.pow(frac_part.len() as u32);
                value += frac * unit / scale;
            }
            total = total.checked_add(value).ok_or(EvalError::DurationOverflow)?;
            if total > (MAX_DURATION_SECONDS + 1) * NANOS_PER_SECOND {
                return Err(EvalError::DurationOverflow);
            }
        }

        Self::from_nanos(if negative { -total } else { total })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.nanos < 0 { "-" } else { "" };
        let abs = self.nanos.abs();
        let secs = abs / NANOS_PER_SECOND;
        let frac = abs % NANOS_PER_SECOND;
        if frac == 0 {
            write!(f, "{sign}{secs}s")
        } else {
            let digits = format!("{frac:09}");
            write!(f, "{sign}{secs}.{}s", digits.trim_end_matches('0'))
        }
    }
}

enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

fn parse_timezone(tz: &str) -> Result<Zone, EvalError> {
    let invalid = || EvalError::InvalidTimezone(tz.into());
    let (sign, offset) = match tz.as_bytes().first() {
        Some(b'+') => (1, Some(&tz[1..])),
        Some(b'-') => (-1, Some(&tz[1..])),
        Some(c) if c.is_ascii_digit() => (1, Some(tz)),
        _ => (1, None),
    };
    match offset {
        Some(offset) => {
            let (h, m) = offset.split_once(':').ok_or_else(invalid)?;
            let h: i32 = h.parse().map_err(|_| invalid())?;
            let m: i32 = m.parse().map_err(|_| invalid())?;
            if !(0..24).contains(&h) || !(0..60).contains(&m) {
                return Err(invalid());
            }
            FixedOffset::east_opt(sign * (h * 3600 + m * 60))
                .map(Zone::Fixed)
                .ok_or_else(invalid)
        }
        None => Tz::from_str(tz).map(Zone::Named).map_err(|_| invalid()),
    }
}

impl Timestamp {
    pub fn from_nanos(nanos: i128) -> Result<Self, EvalError> {
        let secs = nanos.div_euclid(NANOS_PER_SECOND);
        if !(MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&secs) {
            return Err(EvalError::TimestampOverflow);
        }
        Ok(Self { nanos })
    }

    pub fn from_unix(seconds: i64, nanos: u32) -> Result<Self, EvalError> {
        Self::from_nanos(seconds as i128 * NANOS_PER_SECOND + nanos as i128)
    }

    pub fn parse(text: &str) -> Result<Self, EvalError> {
        let dt = DateTime::parse_from_rfc3339(text).map_err(|e| {
            EvalError::conversion(format!("invalid timestamp '{text}': {e}"))
        })?;
        Self::from_unix(dt.timestamp(), dt.timestamp_subsec_nanos())
    }

    pub fn total_nanos(&self) -> i128 {
        self.nanos
    }

    /// Seconds since the Unix epoch, rounded toward negative infinity.
    pub fn unix_seconds(&self) -> i64 {
        self.nanos.div_euclid(NANOS_PER_SECOND) as i64
    }

    pub fn subsec_nanos(&self) -> u32 {
        self.nanos.rem_euclid(NANOS_PER_SECOND) as u32
    }

    pub fn to_datetime(&self) -> Result<DateTime<Utc>, EvalError> {
        DateTime::from_timestamp(self.unix_seconds(), self.subsec_nanos())
            .ok_or(EvalError::TimestampOverflow)
    }

    fn local(&self, tz: Option<&str>) -> Result<NaiveDateTime, EvalError> {
        let dt = self.to_datetime()?;
        Ok(match tz {
            None => dt.naive_utc(),
            Some(tz) => match parse_timezone(tz)? {
                Zone::Fixed(offset) => dt.with_timezone(&offset).naive_local(),
                Zone::Named(zone) => dt.with_timezone(&zone).naive_local(),
            },
        })
    }

    fn component(&self, function: &str, tz: Option<&str>) -> Result<Value, EvalError> {
        let t = self.local(tz)?;
        let v = match function {
            "getFullYear" => t.year() as i64,
            "getMonth" => t.month0() as i64,
            "getDayOfYear" => t.ordinal0() as i64,
            "getDayOfMonth" => t.day0() as i64,
            "getDate" => t.day() as i64,
            "getDayOfWeek" => t.weekday().num_days_from_sunday() as i64,
            "getHours" => t.hour() as i64,
            "getMinutes" => t.minute() as i64,
            "getSeconds" => t.second() as i64,
            "getMilliseconds" => (t.nanosecond() / 1_000_000) as i64,
            _ => {
                return Err(EvalError::no_such_overload(
                    function,
                    &[&Value::Timestamp(*self)],
                ))
            }
        };
        Ok(Value::Int(v))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dt = self.to_datetime().map_err(|_| fmt::Error)?;
        write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))?;
        let frac = self.subsec_nanos();
        if frac != 0 {
            let digits = format!("{frac:09}");
            write!(f, ".{}", digits.trim_end_matches('0'))?;
        }
        f.write_str("Z")
    }
}

impl Adder for Duration {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Duration(d) => Duration::from_nanos(self.nanos + d.nanos).into(),
            Value::Timestamp(t) => Timestamp::from_nanos(t.nanos + self.nanos).into(),
            _ => no_such_overload("_+_", &Value::Duration(*self), other),
        }
    }
}

impl Subtractor for Duration {
    fn subtract(&self, other: &Value) -> Value {
        match other {
            Value::Duration(d) => Duration::from_nanos(self.nanos - d.nanos).into(),
            _ => no_such_overload("_-_", &Value::Duration(*self), other),
        }
    }
}

impl Negater for Duration {
    fn negate(&self) -> Value {
        Duration::from_nanos(-self.nanos).into()
    }
}

impl Comparer for Duration {
    fn compare(&self, other: &Value) -> Value {
        match other {
            Value::Duration(d) => ordering(self.cmp(d)),
            _ => no_such_overload("compare", &Value::Duration(*self), other),
        }
    }
}

impl Receiver for Duration {
    fn receive(&self, function: &str, overload: &str, args: &[Value]) -> Value {
        if !args.is_empty() {
            return EvalError::no_such_overload(overload, &[&Value::Duration(*self)]).into();
        }
        let secs = self.nanos / NANOS_PER_SECOND;
        Value::Int(match function {
            "getHours" => secs / 3600,
            "getMinutes" => secs / 60,
            "getSeconds" => secs,
            "getMilliseconds" => self.nanos / 1_000_000,
            _ => {
                return EvalError::no_such_overload(function, &[&Value::Duration(*self)]).into()
            }
        } as i64)
    }
}

impl Zeroer for Duration {
    fn is_zero_value(&self) -> bool {
        self.nanos == 0
    }
}

impl Adder for Timestamp {
    fn add(&self, other: &Value) -> Value {
        match other {
            Value::Duration(d) => Timestamp::from_nanos(self.nanos + d.nanos).into(),
            _ => no_such_overload("_+_", &Value::Timestamp(*self), other),
        }
    }
}

impl Subtractor for Timestamp {
    fn subtract(&self, other: &Value) -> Value {
        match other {
            Value::Duration(d) => Timestamp::from_nanos(self.nanos - d.nanos).into(),
            Value::Timestamp(t) => Duration::from_nanos(self.nanos - t.nanos).into(),
            _ => no_such_overload("_-_", &Value::Timestamp(*self), other),
        }
    }
}

impl Comparer for Timestamp {
    fn compare(&self, other: &Value) -> Value {
        match other {
            Value::Timestamp(t) => ordering(self.cmp(t)),
            _ => no_such_overload("compare", &Value::Timestamp(*self), other),
        }
    }
}

impl Receiver for Timestamp {
    fn receive(&self, function: &str, overload: &str, args: &[Value]) -> Value {
        let tz = match args {
            [] => None,
            [Value::String(tz)] => Some(&**tz),
            [other] => return no_such_overload(function, &Value::Timestamp(*self), other),
            _ => {
                return EvalError::no_such_overload(overload, &[&Value::Timestamp(*self)]).into()
            }
        };
        self.component(function, tz).unwrap_or_else(Value::Error)
    }
}

impl Zeroer for Timestamp {
    fn is_zero_value(&self) -> bool {
        self.nanos == 0
    }
}

impl From<Result<Duration, EvalError>> for Value {
    fn from(r: Result<Duration, EvalError>) -> Self {
        r.map_or_else(Value::Error, Value::Duration)
    }
}

impl From<Result<Timestamp, EvalError>> for Value {
    fn from(r: Result<Timestamp, EvalError>) -> Self {
        r.map_or_else(Value::Error, Value::Timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_durations() {
        let cases = [
            ("0", 0),
            ("1s", NANOS_PER_SECOND),
            ("-1.5s", -1_500_000_000),
            ("1h30m", 5400 * NANOS_PER_SECOND),
            ("300ms", 300_000_000),
            ("2us", 2_000),
            ("1.5h", 5400 * NANOS_PER_SECOND),
            (".5s", 500_000_000),
        ];
        for (text, nanos) in cases {
            assert_eq!(Duration::parse(text).unwrap().total_nanos(), nanos, "{text}");
        }
        for bad in ["", "1", "1x", "s", "1.s.", "--1s"] {
            assert!(Duration::parse(bad).is_err(), "{bad}");
        }
        assert_eq!(
            Duration::parse("315576000001s"),
            Err(EvalError::DurationOverflow)
        );
    }

    #[test]
    fn display() {
        assert_eq!(Duration::parse("1m").unwrap().to_string(), "60s");
        assert_eq!(Duration::parse("-0.25s").unwrap().to_string(), "-0.25s");
        let ts = Timestamp::parse("2009-02-13T23:31:30.120Z").unwrap();
        assert_eq!(ts.to_string(), "2009-02-13T23:31:30.12Z");
        assert_eq!(ts.unix_seconds(), 1_234_567_890);
    }

    #[test]
    fn timestamp_range() {
        assert!(Timestamp::parse("0001-01-01T00:00:00Z").is_ok());
        assert!(Timestamp::parse("9999-12-31T23:59:59.999999999Z").is_ok());
        let max = Timestamp::parse("9999-12-31T23:59:59Z").unwrap();
        assert!(matches!(
            max.add(&Value::Duration(Duration::new(1, 0).unwrap())),
            Value::Error(EvalError::TimestampOverflow)
        ));
    }

    #[test]
    fn components_with_timezones() {
        let ts = Timestamp::parse("2023-01-01T02:30:00Z").unwrap();
        let year = |tz: Option<&str>| ts.component("getFullYear", tz).unwrap();
        assert!(matches!(year(None), Value::Int(2023)));
        assert!(matches!(year(Some("America/Los_Angeles")), Value::Int(2022)));
        assert!(matches!(year(Some("-03:00")), Value::Int(2022)));
        assert!(matches!(
            ts.component("getHours", Some("+05:30")).unwrap(),
            Value::Int(8)
        ));
        assert!(matches!(
            ts.component("getDayOfWeek", None).unwrap(),
            Value::Int(0)
        ));
        assert!(matches!(
            ts.component("getHours", Some("Mars/Olympus")),
            Err(EvalError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn duration_getters() {
        let d = Duration::parse("1h30m15.5s").unwrap();
        assert!(matches!(d.receive("getHours", "duration_to_hours", &[]), Value::Int(1)));
        assert!(matches!(d.receive("getMinutes", "duration_to_minutes", &[]), Value::Int(90)));
        assert!(matches!(
            d.receive("getMilliseconds", "duration_to_milliseconds", &[]),
            Value::Int(5_415_500)
        ));
    }
}
