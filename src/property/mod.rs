//! Property type conversion table.
//!
//! The engine asks for item metadata by numeric property id.  Each supported
//! id maps to one [`PropertyDescriptor`]: the managed attribute to read and
//! the kind of value expected from it.  Conversion from the raw managed
//! [`Value`] to a [`PropVariant`] is driven by that kind alone.
//!
//! # Format-level facts
//! Two ids never reach the managed object:
//!   - `kpidIsDir` on a flat format (GZip, BZip2) is always `false`.
//!   - `kpidTimeType` is always the Windows FILETIME encoding.
//!
//! # Unknown ids
//! An id outside the table is a protocol error.  The full list of ids known
//! to the engine is available from [`known_ids`] for diagnostics only.

mod ids;

use std::fmt;

use crate::format::ArchiveFormat;
use crate::managed::{Attribute, Value};
use crate::propvariant::{FileTime, PropVariant};

pub use ids::known_ids;

/// `NFileTimeType::kWindows`: timestamps are FILETIME ticks.
pub const FILE_TIME_TYPE_WINDOWS: u32 = 0;

// ── PropId ───────────────────────────────────────────────────────────────────

/// Engine property identifier (`PROPID`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PropId(pub u32);

impl PropId {
    pub const PATH:         PropId = PropId(3);
    pub const IS_DIR:       PropId = PropId(6);
    pub const SIZE:         PropId = PropId(7);
    pub const ATTRIB:       PropId = PropId(9);
    pub const CTIME:        PropId = PropId(10);
    pub const ATIME:        PropId = PropId(11);
    pub const MTIME:        PropId = PropId(12);
    pub const IS_ANTI:      PropId = PropId(21);
    pub const USER:         PropId = PropId(25);
    pub const GROUP:        PropId = PropId(26);
    pub const TIME_TYPE:    PropId = PropId(40);
    pub const POSIX_ATTRIB: PropId = PropId(53);

    /// Engine name of this id, e.g. `kpidPath`, if the engine knows it.
    pub fn name(self) -> Option<&'static str> {
        known_ids().iter().find(|(id, _)| *id == self.0).map(|(_, n)| *n)
    }
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(n) => write!(f, "{n} ({})", self.0),
            None    => write!(f, "{}", self.0),
        }
    }
}

// ── Descriptors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    SignedInt,
    UnsignedInt,
    Boolean,
    Timestamp,
    UnsignedLong,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::String       => "string",
            ValueKind::SignedInt    => "signed int",
            ValueKind::UnsignedInt  => "unsigned int",
            ValueKind::Boolean      => "boolean",
            ValueKind::Timestamp    => "timestamp",
            ValueKind::UnsignedLong => "unsigned long",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub id:        PropId,
    pub attribute: Attribute,
    pub kind:      ValueKind,
}

const fn desc(id: PropId, attribute: Attribute, kind: ValueKind) -> PropertyDescriptor {
    PropertyDescriptor { id, attribute, kind }
}

/// Every per-item property the adapter can answer.
pub static DESCRIPTORS: [PropertyDescriptor; 11] = [
    desc(PropId::ATTRIB,       Attribute::Attributes,           ValueKind::UnsignedInt),
    desc(PropId::POSIX_ATTRIB, Attribute::PosixAttributes,      ValueKind::UnsignedInt),
    desc(PropId::PATH,         Attribute::Path,                 ValueKind::String),
    desc(PropId::IS_DIR,       Attribute::IsDir,                ValueKind::Boolean),
    desc(PropId::IS_ANTI,      Attribute::IsAnti,               ValueKind::Boolean),
    desc(PropId::MTIME,        Attribute::LastModificationTime, ValueKind::Timestamp),
    desc(PropId::ATIME,        Attribute::LastAccessTime,       ValueKind::Timestamp),
    desc(PropId::CTIME,        Attribute::CreationTime,         ValueKind::Timestamp),
    desc(PropId::SIZE,         Attribute::Size,                 ValueKind::UnsignedLong),
    desc(PropId::USER,         Attribute::User,                 ValueKind::String),
    desc(PropId::GROUP,        Attribute::Group,                ValueKind::String),
];

/// Ids answered from format-level facts instead of the descriptor table.
pub const FORMAT_LEVEL_IDS: [PropId; 2] = [PropId::IS_DIR, PropId::TIME_TYPE];

pub fn descriptor(id: PropId) -> Option<&'static PropertyDescriptor> {
    DESCRIPTORS.iter().find(|d| d.id == id)
}

/// `true` if the adapter answers `id` one way or another.
pub fn is_supported(id: PropId) -> bool {
    descriptor(id).is_some() || FORMAT_LEVEL_IDS.contains(&id)
}

/// Check the descriptor table: unique ids, unique attributes, and every id
/// named by a format's property list answerable.
pub fn validate_table() -> Result<(), String> {
    for (i, d) in DESCRIPTORS.iter().enumerate() {
        if DESCRIPTORS[..i].iter().any(|o| o.id == d.id) {
            return Err(format!("duplicate descriptor for {}", d.id));
        }
        if DESCRIPTORS[..i].iter().any(|o| o.attribute == d.attribute) {
            return Err(format!("attribute {} mapped twice", d.attribute));
        }
        if d.id.name().is_none() {
            return Err(format!("descriptor id {} unknown to the engine", d.id.0));
        }
    }
    for format in ArchiveFormat::ALL {
        if let Some(id) = format.item_properties().iter().find(|id| !is_supported(**id)) {
            return Err(format!("{} queries unsupported property {id}", format.name()));
        }
    }
    Ok(())
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    /// Attribute not set; the engine sees `Empty`.
    Absent,
    Value(PropVariant),
    Failure(String),
}

/// Answer `id` from format-level facts, without the item.
pub fn format_override(id: PropId, format: ArchiveFormat) -> Option<PropVariant> {
    match id {
        PropId::IS_DIR if format.is_flat() => Some(PropVariant::Bool(false)),
        PropId::TIME_TYPE                  => Some(PropVariant::UInt32(FILE_TIME_TYPE_WINDOWS)),
        _                                  => None,
    }
}

/// Convert a raw managed value according to `kind`.
pub fn convert_value(kind: ValueKind, value: Value) -> ConversionOutcome {
    let converted = match (kind, value) {
        (_, Value::Null) => return ConversionOutcome::Absent,

        (ValueKind::String,       Value::String(s))  => PropVariant::BStr(s),
        (ValueKind::SignedInt,    Value::Integer(v)) => PropVariant::Int32(v),
        (ValueKind::UnsignedInt,  Value::Integer(v)) => PropVariant::UInt32(v as u32),
        (ValueKind::Boolean,      Value::Boolean(b)) => PropVariant::Bool(b),
        (ValueKind::UnsignedLong, Value::Long(v))    => PropVariant::UInt64(v as u64),
        (ValueKind::UnsignedLong, Value::Integer(v)) => PropVariant::UInt64(i64::from(v) as u64),
        (ValueKind::Timestamp,    Value::Date(dt))   => match FileTime::from_datetime(&dt) {
            Some(ft) => PropVariant::FileTime(ft),
            None => {
                return ConversionOutcome::Failure(format!(
                    "date {dt} is outside the FILETIME range"
                ))
            }
        },

        (kind, other) => {
            return ConversionOutcome::Failure(format!(
                "expected a {} value, managed object returned {}",
                kind.name(),
                other.kind_name()
            ))
        }
    };
    ConversionOutcome::Value(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn table_is_complete_and_consistent() {
        validate_table().unwrap();
        for format in ArchiveFormat::ALL {
            for id in format.item_properties() {
                assert!(is_supported(*id), "{} / {id}", format.name());
            }
        }
    }

    #[test]
    fn flat_formats_force_is_dir_false() {
        assert_eq!(format_override(PropId::IS_DIR, ArchiveFormat::GZip), Some(PropVariant::Bool(false)));
        assert_eq!(format_override(PropId::IS_DIR, ArchiveFormat::BZip2), Some(PropVariant::Bool(false)));
        assert_eq!(format_override(PropId::IS_DIR, ArchiveFormat::SevenZip), None);
        assert_eq!(format_override(PropId::PATH, ArchiveFormat::GZip), None);
    }

    #[test]
    fn time_type_is_windows_everywhere() {
        for format in ArchiveFormat::ALL {
            assert_eq!(
                format_override(PropId::TIME_TYPE, format),
                Some(PropVariant::UInt32(FILE_TIME_TYPE_WINDOWS))
            );
        }
    }

    #[test]
    fn null_is_absent_for_every_kind() {
        for d in &DESCRIPTORS {
            assert_eq!(convert_value(d.kind, Value::Null), ConversionOutcome::Absent);
        }
    }

    #[test]
    fn negative_long_reinterprets_as_unsigned() {
        assert_eq!(
            convert_value(ValueKind::UnsignedLong, Value::Long(-1)),
            ConversionOutcome::Value(PropVariant::UInt64(u64::MAX))
        );
        assert_eq!(
            convert_value(ValueKind::UnsignedInt, Value::Integer(-2)),
            ConversionOutcome::Value(PropVariant::UInt32(0xFFFF_FFFE))
        );
        assert_eq!(
            convert_value(ValueKind::SignedInt, Value::Integer(-2)),
            ConversionOutcome::Value(PropVariant::Int32(-2))
        );
    }

    #[test]
    fn out_of_range_date_is_a_failure() {
        let dt = Utc.with_ymd_and_hms(1200, 6, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            convert_value(ValueKind::Timestamp, Value::Date(dt)),
            ConversionOutcome::Failure(_)
        ));
    }

    #[test]
    fn kind_mismatch_is_a_failure() {
        let out = convert_value(ValueKind::Boolean, Value::String("yes".into()));
        match out {
            ConversionOutcome::Failure(msg) => assert!(msg.contains("boolean")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn prop_id_display_uses_engine_name() {
        assert_eq!(PropId::PATH.to_string(), "kpidPath (3)");
        assert_eq!(PropId(4242).to_string(), "4242");
    }
}
