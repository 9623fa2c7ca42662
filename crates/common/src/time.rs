use chrono::{NaiveDate, NaiveTime};

use crate::{Error, Result};

/// Parse a `YYYY-MM-DD` date string.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidInput(format!("invalid date '{s}': {e}")))
}

/// Milliseconds since epoch at midnight UTC of the given date.
pub fn date_start_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}
