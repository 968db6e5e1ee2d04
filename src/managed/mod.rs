//! The managed side of the boundary.
//!
//! Everything here is implemented by the embedding runtime, not by the
//! adapter.  Each method is one boundary crossing: it may run arbitrary
//! managed code, block on I/O, and fail.  A failure is reported by returning
//! a [`ManagedFault`], the Rust shape of a pending managed exception.
//!
//! The adapter never interprets values it receives alongside a fault and
//! never calls back into the managed side after one within the same
//! engine call; see [`crate::bridge`].

pub mod item;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::format::ArchiveFormat;
use crate::io_stream::DataStream;

pub use item::OutItemRecord;

// ── Faults ───────────────────────────────────────────────────────────────────

/// An exception raised on the managed side during a crossing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{class}: {message}")]
pub struct ManagedFault {
    /// Managed exception class, e.g. `SevenZipException`.
    pub class:   String,
    pub message: String,
}

impl ManagedFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_class("ManagedException", message)
    }

    pub fn with_class(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self { class: class.into(), message: message.into() }
    }
}

// ── Attributes ───────────────────────────────────────────────────────────────

/// Named attribute getters exposed by a managed item-info object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Attributes,
    PosixAttributes,
    Path,
    IsDir,
    IsAnti,
    LastModificationTime,
    LastAccessTime,
    CreationTime,
    Size,
    User,
    Group,
    DataStream,
    UpdateIsNewData,
    UpdateIsNewProperties,
    UpdateOldArchiveItemIndex,
}

impl Attribute {
    /// Attribute name as the managed object spells it.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Attributes                => "propertyAttributes",
            Attribute::PosixAttributes           => "propertyPosixAttributes",
            Attribute::Path                      => "propertyPath",
            Attribute::IsDir                     => "propertyIsDir",
            Attribute::IsAnti                    => "propertyIsAnti",
            Attribute::LastModificationTime      => "propertyLastModificationTime",
            Attribute::LastAccessTime            => "propertyLastAccessTime",
            Attribute::CreationTime              => "propertyCreationTime",
            Attribute::Size                      => "propertySize",
            Attribute::User                      => "propertyUser",
            Attribute::Group                     => "propertyGroup",
            Attribute::DataStream                => "dataStream",
            Attribute::UpdateIsNewData           => "updateIsNewData",
            Attribute::UpdateIsNewProperties     => "updateIsNewProperties",
            Attribute::UpdateOldArchiveItemIndex => "updateOldArchiveItemIndex",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Values ───────────────────────────────────────────────────────────────────

/// A raw value produced by a managed getter.
///
/// Numbers follow the managed numeric model: 32-bit values are signed
/// `Integer`s, sizes and counts are signed 64-bit `Long`s.
#[derive(Clone)]
pub enum Value {
    Null,
    Integer(i32),
    Long(i64),
    Boolean(bool),
    String(String),
    Date(DateTime<Utc>),
    Stream(DataStream),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null       => "null",
            Value::Integer(_) => "integer",
            Value::Long(_)    => "long",
            Value::Boolean(_) => "boolean",
            Value::String(_)  => "string",
            Value::Date(_)    => "date",
            Value::Stream(_)  => "stream",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null       => f.write_str("Null"),
            Value::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Value::Long(v)    => f.debug_tuple("Long").field(v).finish(),
            Value::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            Value::String(v)  => f.debug_tuple("String").field(v).finish(),
            Value::Date(v)    => f.debug_tuple("Date").field(v).finish(),
            Value::Stream(_)  => f.write_str("Stream(..)"),
        }
    }
}

impl From<Option<Value>> for Value {
    fn from(v: Option<Value>) -> Self {
        v.unwrap_or(Value::Null)
    }
}

// ── Item-info object ─────────────────────────────────────────────────────────

/// A managed per-item information object.
pub trait OutItem {
    /// Read one named attribute.  `Value::Null` means "not set".
    fn attribute(&self, attr: Attribute) -> Result<Value, ManagedFault>;
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Identity of the destination archive an update session writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveHandle {
    pub id:     Uuid,
    pub format: ArchiveFormat,
}

impl ArchiveHandle {
    pub fn new(format: ArchiveFormat) -> Self {
        Self { id: Uuid::new_v4(), format }
    }
}

/// Index-scoped factory handed to [`UpdateCallback::get_item_information`].
#[derive(Debug, Clone)]
pub struct OutItemFactory {
    archive: ArchiveHandle,
    index:   u32,
}

impl OutItemFactory {
    pub fn new(archive: ArchiveHandle, index: u32) -> Self {
        Self { archive, index }
    }

    pub fn index(&self) -> u32 { self.index }

    pub fn archive(&self) -> &ArchiveHandle { &self.archive }

    /// A blank item carrying new data and new properties.
    pub fn create_out_item(&self) -> OutItemRecord {
        OutItemRecord::new()
            .with_update_is_new_data(true)
            .with_update_is_new_properties(true)
    }

    /// An item that keeps `old_index` of the archive being updated as-is.
    pub fn create_out_item_for_existing(&self, old_index: u32) -> OutItemRecord {
        OutItemRecord::new()
            .with_update_is_new_data(false)
            .with_update_is_new_properties(false)
            .with_update_old_archive_item_index(old_index)
    }
}

// ── Update callback ──────────────────────────────────────────────────────────

/// The managed callback that describes the items of an update session.
pub trait UpdateCallback {
    type Item: OutItem;

    /// Total number of bytes the engine expects to process.
    fn set_total(&mut self, total: u64) -> Result<(), ManagedFault> {
        let _ = total;
        Ok(())
    }

    /// Bytes processed so far.
    fn set_completed(&mut self, completed: u64) -> Result<(), ManagedFault> {
        let _ = completed;
        Ok(())
    }

    /// Create the factory passed to `get_item_information`.
    fn item_factory(&mut self, archive: &ArchiveHandle, index: u32) -> Result<OutItemFactory, ManagedFault> {
        Ok(OutItemFactory::new(archive.clone(), index))
    }

    /// Describe item `index`.  Returning `None` violates the contract.
    fn get_item_information(
        &mut self,
        index:   u32,
        factory: OutItemFactory,
    ) -> Result<Option<Self::Item>, ManagedFault>;

    /// Called once when the adapter lets go of `item`.
    fn free_resources(&mut self, index: u32, item: &Self::Item) -> Result<(), ManagedFault> {
        let _ = (index, item);
        Ok(())
    }

    /// Outcome of the item most recently processed.
    fn set_operation_result(&mut self, ok: bool) -> Result<(), ManagedFault>;
}
