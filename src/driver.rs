//! Reference driver: a stand-in for the archive engine.
//!
//! [`UpdateDriver`] walks an [`ArchiveUpdateCallback`] through the same call
//! sequence the engine uses when writing an archive of a given format, and
//! records what it learned about each item as a [`PackedItem`].  It encodes
//! nothing; the streamed bytes are only counted and checksummed.
//!
//! # Call sequence
//! ```text
//! SetTotal(total)
//! GetProperty(0, kpidTimeType)                      (once, if any items)
//! for each index:
//!     GetUpdateItemInfo(i)
//!     GetProperty(i, p) for p in format.item_properties()   (new properties)
//!     GetStream(i) → read to end → SetCompleted → SetOperationResult
//!                                                   (new data, regular file)
//! ```
//! The driver stops at the first failing call, as the engine does.

use std::io::{self, Read};

use chrono::{DateTime, Utc};
use crc32fast::Hasher;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::bridge::BridgeError;
use crate::callback::{ArchiveUpdateCallback, OperationResult, UpdateItemInfo};
use crate::format::ArchiveFormat;
use crate::property::{PropId, FILE_TIME_TYPE_WINDOWS};
use crate::propvariant::PropVariant;

/// Read buffer used when draining item streams: 64 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("{call} failed (item {index:?}, status {status}): {source}")]
    Callback {
        call:   &'static str,
        index:  Option<u32>,
        status: i32,
        #[source]
        source: BridgeError,
    },
    #[error("Reading the data stream of item {index} failed: {source}")]
    Stream {
        index:  u32,
        #[source]
        source: io::Error,
    },
    #[error("Engine expects FILETIME timestamps, callback declared time type {0}")]
    TimeType(String),
}

impl DriverError {
    fn callback(call: &'static str, index: Option<u32>, source: BridgeError) -> Self {
        DriverError::Callback { call, index, status: source.status(), source }
    }
}

/// What the driver learned about one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackedItem {
    pub index:            u32,
    pub new_data:         bool,
    pub new_properties:   bool,
    pub index_in_archive: Option<u32>,
    pub path:             Option<String>,
    pub is_dir:           bool,
    pub is_anti:          bool,
    pub size:             Option<u64>,
    pub attributes:       Option<u32>,
    pub posix_attributes: Option<u32>,
    pub mtime:            Option<DateTime<Utc>>,
    pub atime:            Option<DateTime<Utc>>,
    pub ctime:            Option<DateTime<Utc>>,
    pub user:             Option<String>,
    pub group:            Option<String>,
    /// `sequential` or `random-access`, when a stream was read.
    pub stream:           Option<String>,
    pub data_len:         u64,
    pub crc32:            Option<u32>,
}

impl PackedItem {
    fn new(index: u32, info: UpdateItemInfo) -> Self {
        Self {
            index,
            new_data:         info.new_data,
            new_properties:   info.new_properties,
            index_in_archive: info.index_in_archive,
            ..Self::default()
        }
    }

    fn apply(&mut self, prop: PropId, value: &PropVariant) {
        let time = || value.as_filetime().and_then(|ft| ft.to_datetime());
        match prop {
            PropId::PATH         => self.path = value.as_str().map(str::to_owned),
            PropId::IS_DIR       => self.is_dir = value.as_bool().unwrap_or(false),
            PropId::IS_ANTI      => self.is_anti = value.as_bool().unwrap_or(false),
            PropId::SIZE         => self.size = value.as_u64(),
            PropId::ATTRIB       => self.attributes = value.as_u32(),
            PropId::POSIX_ATTRIB => self.posix_attributes = value.as_u32(),
            PropId::MTIME        => self.mtime = time(),
            PropId::ATIME        => self.atime = time(),
            PropId::CTIME        => self.ctime = time(),
            PropId::USER         => self.user = value.as_str().map(str::to_owned),
            PropId::GROUP        => self.group = value.as_str().map(str::to_owned),
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpdateDriver {
    pub format:      ArchiveFormat,
    pub buffer_size: usize,
}

impl UpdateDriver {
    pub fn new(format: ArchiveFormat) -> Self {
        Self { format, buffer_size: DEFAULT_BUFFER_SIZE }
    }

    /// Drive `count` items.  `total` is the byte total announced up front.
    pub fn run<A>(&self, callback: &mut A, count: u32, total: u64) -> Result<Vec<PackedItem>, DriverError>
    where
        A: ArchiveUpdateCallback + ?Sized,
    {
        callback
            .set_total(total)
            .map_err(|e| DriverError::callback("SetTotal", None, e))?;

        if count > 0 {
            let mut time_type = PropVariant::Empty;
            callback
                .get_property(0, PropId::TIME_TYPE, Some(&mut time_type))
                .map_err(|e| DriverError::callback("GetProperty", Some(0), e))?;
            if time_type != PropVariant::UInt32(FILE_TIME_TYPE_WINDOWS) {
                return Err(DriverError::TimeType(time_type.to_string()));
            }
        }

        let mut completed = 0u64;
        let mut items = Vec::new();
        for index in 0..count {
            let item = self.pack_item(callback, index, &mut completed)?;
            items.push(item);
        }
        debug!(format = self.format.name(), items = items.len(), bytes = completed, "update finished");
        Ok(items)
    }

    fn pack_item<A>(&self, callback: &mut A, index: u32, completed: &mut u64) -> Result<PackedItem, DriverError>
    where
        A: ArchiveUpdateCallback + ?Sized,
    {
        let info = callback
            .get_update_item_info(index)
            .map_err(|e| DriverError::callback("GetUpdateItemInfo", Some(index), e))?;
        let mut item = PackedItem::new(index, info);

        if info.new_properties {
            for &prop in self.format.item_properties() {
                let mut value = PropVariant::Empty;
                callback
                    .get_property(index, prop, Some(&mut value))
                    .map_err(|e| DriverError::callback("GetProperty", Some(index), e))?;
                item.apply(prop, &value);
            }
        }

        if !info.new_data || item.is_dir || item.is_anti {
            return Ok(item);
        }

        let mut stream = callback
            .get_stream(index)
            .map_err(|e| DriverError::callback("GetStream", Some(index), e))?;
        item.stream = Some(stream.capability().name().to_owned());

        let mut hasher = Hasher::new();
        let mut buf = vec![0u8; self.buffer_size.max(1)];
        loop {
            let n = match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    drop(stream);
                    if let Err(e) = callback.set_operation_result(OperationResult::Error) {
                        warn!(index, "reporting the failed item failed too: {e}");
                    }
                    return Err(DriverError::Stream { index, source });
                }
            };
            hasher.update(&buf[..n]);
            item.data_len += n as u64;
        }
        drop(stream);
        item.crc32 = Some(hasher.finalize());

        if let Some(declared) = item.size {
            if declared != item.data_len {
                warn!(index, declared, read = item.data_len, "stream length differs from declared size");
            }
        }

        *completed += item.data_len;
        callback
            .set_completed(*completed)
            .map_err(|e| DriverError::callback("SetCompleted", Some(index), e))?;
        callback
            .set_operation_result(OperationResult::Ok)
            .map_err(|e| DriverError::callback("SetOperationResult", Some(index), e))?;
        Ok(item)
    }
}
