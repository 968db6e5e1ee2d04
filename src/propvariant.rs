//! Tagged variant record handed to the engine by `GetProperty`.
//!
//! Each variant corresponds to one engine `VARTYPE`; [`PropVariant::vt`]
//! returns the numeric tag.  `Empty` is the unset representation and is what
//! the engine receives for an attribute the managed object did not set.

use std::fmt;

use chrono::{DateTime, Utc};

pub const VT_EMPTY:    u16 = 0;
pub const VT_I4:       u16 = 3;
pub const VT_BSTR:     u16 = 8;
pub const VT_BOOL:     u16 = 11;
pub const VT_UI4:      u16 = 19;
pub const VT_UI8:      u16 = 21;
pub const VT_FILETIME: u16 = 64;

/// Seconds between 1601-01-01 (the engine epoch) and 1970-01-01.
pub const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;
/// FILETIME resolution: 100 ns ticks per second.
pub const FILETIME_TICKS_PER_SEC:    u64 = 10_000_000;

// ── FileTime ─────────────────────────────────────────────────────────────────

/// Hundred-nanosecond ticks since 1601-01-01 UTC.
///
/// The engine treats the value as a signed 64-bit quantity, so only
/// `0..=i64::MAX` is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileTime(pub u64);

impl FileTime {
    /// Convert a UTC timestamp.  Returns `None` for dates before the epoch or
    /// past the signed 64-bit tick range.
    pub fn from_datetime(dt: &DateTime<Utc>) -> Option<Self> {
        let secs = dt.timestamp().checked_add(FILETIME_UNIX_OFFSET_SECS)?;
        if secs < 0 {
            return None;
        }
        let ticks = (secs as u64)
            .checked_mul(FILETIME_TICKS_PER_SEC)?
            .checked_add(u64::from(dt.timestamp_subsec_nanos()) / 100)?;
        if ticks > i64::MAX as u64 {
            return None;
        }
        Some(FileTime(ticks))
    }

    /// Inverse of [`FileTime::from_datetime`] (diagnostics and tests).
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs  = (self.0 / FILETIME_TICKS_PER_SEC) as i64 - FILETIME_UNIX_OFFSET_SECS;
        let nanos = ((self.0 % FILETIME_TICKS_PER_SEC) * 100) as u32;
        DateTime::<Utc>::from_timestamp(secs, nanos)
    }
}

// ── PropVariant ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropVariant {
    #[default]
    Empty,
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    UInt64(u64),
    FileTime(FileTime),
    BStr(String),
}

impl PropVariant {
    /// Engine `VARTYPE` tag.
    pub fn vt(&self) -> u16 {
        match self {
            PropVariant::Empty       => VT_EMPTY,
            PropVariant::Bool(_)     => VT_BOOL,
            PropVariant::Int32(_)    => VT_I4,
            PropVariant::UInt32(_)   => VT_UI4,
            PropVariant::UInt64(_)   => VT_UI8,
            PropVariant::FileTime(_) => VT_FILETIME,
            PropVariant::BStr(_)     => VT_BSTR,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PropVariant::Empty)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropVariant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropVariant::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PropVariant::UInt64(v) => Some(*v),
            PropVariant::UInt32(v) => Some(u64::from(*v)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropVariant::BStr(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_filetime(&self) -> Option<FileTime> {
        match self {
            PropVariant::FileTime(ft) => Some(*ft),
            _ => None,
        }
    }

    /// Take the value out, leaving `Empty` behind.
    pub fn take(&mut self) -> PropVariant {
        std::mem::take(self)
    }
}

impl fmt::Display for PropVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropVariant::Empty        => f.write_str("-"),
            PropVariant::Bool(b)      => write!(f, "{b}"),
            PropVariant::Int32(v)     => write!(f, "{v}"),
            PropVariant::UInt32(v)    => write!(f, "{v}"),
            PropVariant::UInt64(v)    => write!(f, "{v}"),
            PropVariant::BStr(s)      => f.write_str(s),
            PropVariant::FileTime(ft) => match ft.to_datetime() {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
                None     => write!(f, "filetime:{}", ft.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unix_epoch_maps_to_offset() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        let ft = FileTime::from_datetime(&epoch).unwrap();
        assert_eq!(ft.0, FILETIME_UNIX_OFFSET_SECS as u64 * FILETIME_TICKS_PER_SEC);
        assert_eq!(ft.to_datetime(), Some(epoch));
    }

    #[test]
    fn sub_second_precision_is_kept_to_100ns() {
        let dt = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let ft = FileTime::from_datetime(&dt).unwrap();
        assert_eq!(ft.0 % FILETIME_TICKS_PER_SEC, 1_234_567);
    }

    #[test]
    fn before_1601_is_out_of_range() {
        let dt = Utc.with_ymd_and_hms(1500, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(FileTime::from_datetime(&dt), None);
    }

    #[test]
    fn far_future_is_out_of_range() {
        let dt = Utc.with_ymd_and_hms(100_000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(FileTime::from_datetime(&dt), None);
    }

    #[test]
    fn empty_is_default_and_vt_empty() {
        let mut v = PropVariant::BStr("x".into());
        assert_eq!(v.vt(), VT_BSTR);
        assert_eq!(v.take(), PropVariant::BStr("x".into()));
        assert!(v.is_empty());
        assert_eq!(v.vt(), VT_EMPTY);
    }
}
