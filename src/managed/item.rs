//! Stock item-info object: an attribute bag filled in by the managed
//! callback, one field per [`Attribute`].

use std::fmt;

use chrono::{DateTime, Utc};

use super::{Attribute, ManagedFault, OutItem, Value};
use crate::io_stream::DataStream;

#[derive(Clone, Default)]
pub struct OutItemRecord {
    pub attributes:        Option<u32>,
    pub posix_attributes:  Option<u32>,
    pub path:              Option<String>,
    pub is_dir:            Option<bool>,
    pub is_anti:           Option<bool>,
    pub modification_time: Option<DateTime<Utc>>,
    pub access_time:       Option<DateTime<Utc>>,
    pub creation_time:     Option<DateTime<Utc>>,
    pub size:              Option<u64>,
    pub user:              Option<String>,
    pub group:             Option<String>,
    pub data_stream:       Option<DataStream>,

    pub update_is_new_data:            Option<bool>,
    pub update_is_new_properties:      Option<bool>,
    pub update_old_archive_item_index: Option<u32>,
}

impl OutItemRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attributes(mut self, v: u32) -> Self { self.attributes = Some(v); self }
    pub fn with_posix_attributes(mut self, v: u32) -> Self { self.posix_attributes = Some(v); self }
    pub fn with_path(mut self, v: impl Into<String>) -> Self { self.path = Some(v.into()); self }
    pub fn with_is_dir(mut self, v: bool) -> Self { self.is_dir = Some(v); self }
    pub fn with_is_anti(mut self, v: bool) -> Self { self.is_anti = Some(v); self }
    pub fn with_modification_time(mut self, v: DateTime<Utc>) -> Self { self.modification_time = Some(v); self }
    pub fn with_access_time(mut self, v: DateTime<Utc>) -> Self { self.access_time = Some(v); self }
    pub fn with_creation_time(mut self, v: DateTime<Utc>) -> Self { self.creation_time = Some(v); self }
    pub fn with_size(mut self, v: u64) -> Self { self.size = Some(v); self }
    pub fn with_user(mut self, v: impl Into<String>) -> Self { self.user = Some(v.into()); self }
    pub fn with_group(mut self, v: impl Into<String>) -> Self { self.group = Some(v.into()); self }
    pub fn with_data_stream(mut self, v: DataStream) -> Self { self.data_stream = Some(v); self }

    pub fn with_update_is_new_data(mut self, v: bool) -> Self {
        self.update_is_new_data = Some(v);
        self
    }

    pub fn with_update_is_new_properties(mut self, v: bool) -> Self {
        self.update_is_new_properties = Some(v);
        self
    }

    pub fn with_update_old_archive_item_index(mut self, v: u32) -> Self {
        self.update_old_archive_item_index = Some(v);
        self
    }
}

impl OutItem for OutItemRecord {
    fn attribute(&self, attr: Attribute) -> Result<Value, ManagedFault> {
        // Unsigned fields travel as the managed signed types of the same width.
        let v = match attr {
            Attribute::Attributes           => self.attributes.map(|v| Value::Integer(v as i32)),
            Attribute::PosixAttributes      => self.posix_attributes.map(|v| Value::Integer(v as i32)),
            Attribute::Path                 => self.path.clone().map(Value::String),
            Attribute::IsDir                => self.is_dir.map(Value::Boolean),
            Attribute::IsAnti               => self.is_anti.map(Value::Boolean),
            Attribute::LastModificationTime => self.modification_time.map(Value::Date),
            Attribute::LastAccessTime       => self.access_time.map(Value::Date),
            Attribute::CreationTime         => self.creation_time.map(Value::Date),
            Attribute::Size                 => self.size.map(|v| Value::Long(v as i64)),
            Attribute::User                 => self.user.clone().map(Value::String),
            Attribute::Group                => self.group.clone().map(Value::String),
            Attribute::DataStream           => self.data_stream.clone().map(Value::Stream),
            Attribute::UpdateIsNewData       => self.update_is_new_data.map(Value::Boolean),
            Attribute::UpdateIsNewProperties => self.update_is_new_properties.map(Value::Boolean),
            Attribute::UpdateOldArchiveItemIndex => {
                self.update_old_archive_item_index.map(|v| Value::Integer(v as i32))
            }
        };
        Ok(v.into())
    }
}

impl fmt::Debug for OutItemRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutItemRecord")
            .field("path", &self.path)
            .field("is_dir", &self.is_dir)
            .field("size", &self.size)
            .field("attributes", &self.attributes)
            .field("modification_time", &self.modification_time)
            .field("has_data_stream", &self.data_stream.is_some())
            .field("update_is_new_data", &self.update_is_new_data)
            .field("update_is_new_properties", &self.update_is_new_properties)
            .field("update_old_archive_item_index", &self.update_old_archive_item_index)
            .finish_non_exhaustive()
    }
}
