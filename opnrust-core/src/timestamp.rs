//! Device timestamp encodings
//!
//! The scanner uses two unrelated date formats:
//!
//! - a packed 32-bit value stored with every barcode record
//! - a 6-byte sequence used when setting and echoing the clock
//!
//! ```text
//! packed (u32, big-endian on the wire)
//!  31    26 25    20 19  15 14  10 9     6 5    0
//! ┌────────┬────────┬──────┬──────┬───────┬──────┐
//! │ second │ minute │ hour │ day  │ month │ year │
//! └────────┴────────┴──────┴──────┴───────┴──────┘
//!
//! wire (6 bytes)
//! [second, minute, hour, day, month, year-2000]
//! ```

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Years are stored as an offset from this base
pub const YEAR_BASE: i32 = 2000;

/// Last year the 6-bit packed field can hold
pub const MAX_PACKED_YEAR: i32 = YEAR_BASE + 0x3F;

/// Last year the single-byte wire field can hold
pub const MAX_WIRE_YEAR: i32 = YEAR_BASE + u8::MAX as i32;

/// Size of the wire encoding in bytes
pub const WIRE_SIZE: usize = 6;

/// Decode a packed barcode timestamp
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] if the fields do not form a valid
/// calendar date and time (month 0, day 31 in April, hour 24, ...).
///
/// # Examples
///
/// ```
/// use opnrust_core::timestamp;
///
/// let packed = timestamp::encode_packed(
///     &chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
///         .unwrap()
///         .and_hms_opt(14, 30, 45)
///         .unwrap(),
/// )
/// .unwrap();
///
/// let date = timestamp::decode_packed(packed).unwrap();
/// assert_eq!(date.to_string(), "2024-03-15 14:30:45");
/// ```
pub fn decode_packed(value: u32) -> Result<NaiveDateTime> {
    let year = (value & 0x3F) as i32 + YEAR_BASE;
    let month = (value >> 6) & 0x0F;
    let day = (value >> 10) & 0x1F;
    let hour = (value >> 15) & 0x1F;
    let minute = (value >> 20) & 0x3F;
    let second = (value >> 26) & 0x3F;

    civil(year, month, day, hour, minute, second)
        .ok_or_else(|| Error::InvalidTimestamp(format!("packed value 0x{value:08X}")))
}

/// Pack a calendar datetime into the barcode timestamp layout
///
/// Sub-second precision is dropped.
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] for years outside 2000–2063.
pub fn encode_packed(date: &NaiveDateTime) -> Result<u32> {
    let year = date.year();
    if !(YEAR_BASE..=MAX_PACKED_YEAR).contains(&year) {
        return Err(Error::InvalidTimestamp(format!(
            "year {year} outside {YEAR_BASE}..={MAX_PACKED_YEAR}"
        )));
    }

    Ok((year - YEAR_BASE) as u32
        | date.month() << 6
        | date.day() << 10
        | date.hour() << 15
        | date.minute() << 20
        | date.second() << 26)
}

/// Encode a datetime for a SetTime request
///
/// # Errors
///
/// Returns [`Error::InvalidTimestamp`] for years outside 2000–2255.
pub fn encode_wire(date: &NaiveDateTime) -> Result<[u8; WIRE_SIZE]> {
    let year = date.year();
    if !(YEAR_BASE..=MAX_WIRE_YEAR).contains(&year) {
        return Err(Error::InvalidTimestamp(format!(
            "year {year} outside {YEAR_BASE}..={MAX_WIRE_YEAR}"
        )));
    }

    // Every component below fits in a byte for a valid NaiveDateTime
    Ok([
        date.second() as u8,
        date.minute() as u8,
        date.hour() as u8,
        date.day() as u8,
        date.month() as u8,
        (year - YEAR_BASE) as u8,
    ])
}

/// Decode the 6-byte clock encoding echoed by SetTime responses
pub fn decode_wire(bytes: [u8; WIRE_SIZE]) -> Result<NaiveDateTime> {
    let [second, minute, hour, day, month, year] = bytes;

    civil(
        year as i32 + YEAR_BASE,
        month.into(),
        day.into(),
        hour.into(),
        minute.into(),
        second.into(),
    )
    .ok_or_else(|| Error::InvalidTimestamp(format!("wire bytes {}", hex::encode(bytes))))
}

fn civil(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}
