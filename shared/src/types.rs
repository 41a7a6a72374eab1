//! Common types used across the harvest planner

use std::str::FromStr;

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Optional date bounds for planned-date filtering.
///
/// Both bounds are inclusive; the end bound covers the whole end day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, with = "lenient::opt_date")]
    pub start: Option<NaiveDate>,
    #[serde(default, with = "lenient::opt_date")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// True when neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Check a date against the bounds
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }
}

/// Parse a numeric form input.
///
/// Returns `None` for blank input and for anything that is not a number.
/// Surrounding whitespace is ignored and scientific notation is accepted.
pub fn parse_number(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// True when the input is blank or parses as a number
pub fn is_numeric_or_blank(input: &str) -> bool {
    input.trim().is_empty() || parse_number(input).is_some()
}

/// Parse a date form input (`YYYY-MM-DD` or an RFC 3339 timestamp)
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|dt| dt.naive_utc().date())
        })
}

/// Format a date for a date input
pub fn format_date_input(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Serde adapters for document-store records whose numeric and date fields
/// were written by different client versions.
///
/// Numbers are read from JSON numbers or numeric strings, dates from
/// `YYYY-MM-DD`, RFC 3339 or `{ "seconds": .. }` timestamp objects.
/// Numbers are written back as JSON numbers.
pub mod lenient {
    use chrono::{DateTime, NaiveDate};
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberLike {
        Int(i64),
        Float(f64),
        Text(String),
    }

    impl NumberLike {
        fn into_decimal(self) -> Option<Decimal> {
            match self {
                NumberLike::Int(v) => Some(Decimal::from(v)),
                NumberLike::Float(v) => Decimal::from_f64(v),
                NumberLike::Text(s) => super::parse_number(&s),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DateLike {
        Timestamp { seconds: i64 },
        Text(String),
    }

    fn write_decimal<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        match value.to_f64() {
            Some(v) => serializer.serialize_f64(v),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    /// `Decimal` that reads missing or invalid values as zero
    pub mod decimal {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
            write_decimal(value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
            let raw = Option::<NumberLike>::deserialize(deserializer)?;
            Ok(raw.and_then(NumberLike::into_decimal).unwrap_or(Decimal::ZERO))
        }
    }

    /// `Option<Decimal>` that reads invalid values as `None`
    pub mod opt_decimal {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<Decimal>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => write_decimal(v, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Decimal>, D::Error> {
            let raw = Option::<NumberLike>::deserialize(deserializer)?;
            Ok(raw.and_then(NumberLike::into_decimal))
        }
    }

    /// `Option<NaiveDate>` accepting every stored date shape
    pub mod opt_date {
        use super::*;

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDate>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            let raw = Option::<DateLike>::deserialize(deserializer)?;
            Ok(match raw {
                Some(DateLike::Timestamp { seconds }) => {
                    DateTime::from_timestamp(seconds, 0).map(|dt| dt.date_naive())
                }
                Some(DateLike::Text(s)) => super::super::parse_date(&s),
                None => None,
            })
        }
    }
}
