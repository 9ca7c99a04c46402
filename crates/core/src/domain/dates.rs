use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone};
use rust_decimal::prelude::ToPrimitive;

use crate::domain::change::ChangeValue;

/// Source of the local calendar date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Normalizes an effective date into a `YYYY-MM-DD` string.
///
/// Text passes through untouched. Dates, timestamps and epoch-millisecond numbers are
/// reduced to local year/month/day. A missing value, or a number that is not a valid
/// instant, yields today's local date.
pub fn normalize_effective_date(value: Option<&ChangeValue>, clock: &dyn Clock) -> String {
    let date = match value {
        Some(ChangeValue::Text(text)) => return text.clone(),
        Some(ChangeValue::Date(date)) => *date,
        Some(ChangeValue::Timestamp(instant)) => instant.with_timezone(&Local).date_naive(),
        Some(ChangeValue::Number(millis)) => millis
            .to_i64()
            .and_then(|millis| Local.timestamp_millis_opt(millis).single())
            .map(|instant: DateTime<Local>| instant.date_naive())
            .unwrap_or_else(|| clock.today()),
        None => clock.today(),
    };

    format_calendar_date(date)
}

/// Parses a normalized calendar string; anything else yields `None`.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}
