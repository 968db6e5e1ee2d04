//! Archive formats the engine can write, and the format-level facts the
//! adapter needs about them.
//!
//! Some formats are flat containers: a GZip or BZip2 file compresses one
//! stream and has no notion of a directory.  For those, the directory flag is
//! decided here and never asked of the managed item.

use crate::property::PropId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    SevenZip,
    Zip,
    Tar,
    GZip,
    BZip2,
}

impl ArchiveFormat {
    pub const ALL: [ArchiveFormat; 5] = [
        ArchiveFormat::SevenZip,
        ArchiveFormat::Zip,
        ArchiveFormat::Tar,
        ArchiveFormat::GZip,
        ArchiveFormat::BZip2,
    ];

    /// Human-readable name (for diagnostics and the CLI).
    pub fn name(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Zip      => "zip",
            ArchiveFormat::Tar      => "tar",
            ArchiveFormat::GZip     => "gzip",
            ArchiveFormat::BZip2    => "bzip2",
        }
    }

    /// Parse from a CLI string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "7z" | "sevenzip" => Some(ArchiveFormat::SevenZip),
            "zip"             => Some(ArchiveFormat::Zip),
            "tar"             => Some(ArchiveFormat::Tar),
            "gz" | "gzip"     => Some(ArchiveFormat::GZip),
            "bz2" | "bzip2"   => Some(ArchiveFormat::BZip2),
            _                 => None,
        }
    }

    /// Single-stream container without a directory concept.
    #[inline]
    pub fn is_flat(self) -> bool {
        matches!(self, ArchiveFormat::GZip | ArchiveFormat::BZip2)
    }

    /// Per-item properties the engine queries when writing this format, in
    /// the order it asks for them.
    pub fn item_properties(self) -> &'static [PropId] {
        match self {
            ArchiveFormat::SevenZip => &[
                PropId::PATH, PropId::IS_DIR, PropId::IS_ANTI, PropId::SIZE,
                PropId::ATTRIB, PropId::CTIME, PropId::ATIME, PropId::MTIME,
            ],
            ArchiveFormat::Zip => &[
                PropId::PATH, PropId::IS_DIR, PropId::SIZE, PropId::ATTRIB,
                PropId::MTIME, PropId::ATIME, PropId::CTIME,
            ],
            ArchiveFormat::Tar => &[
                PropId::PATH, PropId::IS_DIR, PropId::SIZE, PropId::POSIX_ATTRIB,
                PropId::MTIME, PropId::USER, PropId::GROUP,
            ],
            ArchiveFormat::GZip => &[
                PropId::PATH, PropId::IS_DIR, PropId::SIZE, PropId::MTIME,
            ],
            ArchiveFormat::BZip2 => &[PropId::IS_DIR, PropId::SIZE],
        }
    }
}
