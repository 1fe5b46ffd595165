//! SIP2 timestamps.
//!
//! The wire form is `YYYYMMDDZZZZHHMMSS`: date, a four character timezone
//! slot, then time. The zone slot is written as blanks, meaning local time.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::protocol::schema::DATE_WIDTH;

/// chrono format string producing the 18 character wire form.
pub const WIRE_FORMAT: &str = "%Y%m%d    %H%M%S";

/// Current local time at second precision.
pub fn now() -> NaiveDateTime {
    truncate(Local::now().naive_local())
}

/// Drops sub-second precision, which the wire form cannot carry.
pub fn truncate(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

pub fn format(value: &NaiveDateTime) -> String {
    value.format(WIRE_FORMAT).to_string()
}

/// Parses a wire timestamp.
///
/// A blank field yields `Ok(None)`. The zone slot is ignored.
pub fn parse(raw: &str) -> Result<Option<NaiveDateTime>, &'static str> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    if raw.len() != DATE_WIDTH {
        return Err("timestamp must be 18 characters");
    }

    let date = raw
        .get(0..8)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok())
        .ok_or("invalid date part")?;
    let time = raw
        .get(12..18)
        .and_then(|t| NaiveTime::parse_from_str(t, "%H%M%S").ok())
        .ok_or("invalid time part")?;

    Ok(Some(NaiveDateTime::new(date, time)))
}
