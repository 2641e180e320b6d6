//! Typed values produced by the A-XDR parser.

use chrono::NaiveDate;

/// A scalar value from the APDU.
///
/// A tagged variant replaces the per-type class hierarchy a meter stack
/// would otherwise grow; the discriminant is all the uplink encoder needs
/// to pick a type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    OctetString(String),
}

/// A parsed scalar together with the structure and array counters that
/// were current when it was parsed.
///
/// `structure_ident` is the remaining field count of the enclosing
/// structure (before this value consumed one slot); `array_ident` the
/// remaining element count of the enclosing array. Extractors match on
/// these to identify descriptor positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedValue {
    pub value: Value,
    pub structure_ident: u8,
    pub array_ident: u8,
}

impl TypedValue {
    pub fn as_octet_string(&self) -> Option<&str> {
        match &self.value {
            Value::OctetString(s) => Some(s),
            _ => None,
        }
    }
}

/// The date-time carried at the top of a DataNotification.
///
/// Only the calendar fields are kept; weekday, hundredths, deviation and
/// clock status are passed over on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DlmsDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DlmsDateTime {
    /// Seconds since the Unix epoch, treating the meter clock as UTC.
    /// Returns `None` for calendar-invalid field combinations.
    pub fn as_unix_timestamp(&self) -> Option<i64> {
        let date = NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?;
        let dt = date.and_hms_opt(self.hour as u32, self.minute as u32, self.second as u32)?;
        Some(dt.and_utc().timestamp())
    }

    /// True when no date-time tag was seen in the APDU.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for DlmsDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}.{:02}.{:04} {:02}:{:02}:{:02}",
            self.day, self.month, self.year, self.hour, self.minute, self.second
        )
    }
}
