//! Update callback adapter, the engine-facing side of an update session.
//!
//! The engine drives one [`UpdateCallbackAdapter`] per update through the
//! fixed [`ArchiveUpdateCallback`] contract.  For each item it typically
//! calls, in order:
//!
//! ```text
//! GetUpdateItemInfo(i) → GetProperty(i, …)* → GetStream(i) → SetOperationResult
//! ```
//!
//! The adapter answers from the managed [`UpdateCallback`], resolving the
//! item-info object for `i` once through the [`ItemInfoCache`] and converting
//! each property through the descriptor table.
//!
//! # Item phases
//! `Unresolved → Resolved → Streaming → Reported`.  Any call naming a new
//! index moves back to `Resolved` for that index, as does `GetUpdateItemInfo`
//! for the current one.  A result reported with no resolved item leaves the
//! phase alone.
//!
//! # Engine contract
//! Calls for one item are expected to finish before the next item starts.
//! The adapter stays correct if the engine interleaves indices, but each
//! switch costs a release and a fresh fetch on the managed side.
//!
//! # Failure
//! Every engine-facing method runs inside its own [`Crossing`].  A failure
//! of any kind is returned as `Err(BridgeError)`; [`BridgeError::status`]
//! gives the native code.  The error is also kept as [`last_error`] for the
//! embedding runtime.
//!
//! [`last_error`]: UpdateCallbackAdapter::last_error

use tracing::{debug, enabled, trace, warn, Level};

use crate::bridge::{BridgeError, Crossing};
use crate::cache::ItemInfoCache;
use crate::format::ArchiveFormat;
use crate::io_stream::{self, NativeStream};
use crate::managed::{ArchiveHandle, Attribute, OutItem, UpdateCallback, Value};
use crate::property::{self, ConversionOutcome, PropId};
use crate::propvariant::PropVariant;

/// `indexInArchive` value meaning "no item in the archive being updated".
pub const NO_ARCHIVE_INDEX: u32 = u32::MAX;

// ── Engine contract ──────────────────────────────────────────────────────────

/// The engine's fixed update-callback contract.
pub trait ArchiveUpdateCallback {
    fn set_total(&mut self, total: u64) -> Result<(), BridgeError>;

    fn set_completed(&mut self, completed: u64) -> Result<(), BridgeError>;

    fn get_update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo, BridgeError>;

    /// Fill `value` with property `prop` of item `index`.  `None` asks only
    /// whether the call is accepted.
    fn get_property(
        &mut self,
        index: u32,
        prop:  PropId,
        value: Option<&mut PropVariant>,
    ) -> Result<(), BridgeError>;

    fn get_stream(&mut self, index: u32) -> Result<NativeStream, BridgeError>;

    fn set_operation_result(&mut self, result: OperationResult) -> Result<(), BridgeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateItemInfo {
    pub new_data:         bool,
    pub new_properties:   bool,
    /// Index of the item in the archive being updated, if any.
    pub index_in_archive: Option<u32>,
}

impl UpdateItemInfo {
    /// An item written from scratch.
    pub fn new_item() -> Self {
        Self { new_data: true, new_properties: true, index_in_archive: None }
    }

    /// `indexInArchive` as the engine encodes it.
    pub fn raw_index_in_archive(&self) -> u32 {
        self.index_in_archive.unwrap_or(NO_ARCHIVE_INDEX)
    }
}

/// `NUpdate::NOperationResult` as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationResult {
    Ok,
    Error,
    Other(i32),
}

impl OperationResult {
    pub const K_OK:    i32 = 0;
    pub const K_ERROR: i32 = 1;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::K_OK    => OperationResult::Ok,
            Self::K_ERROR => OperationResult::Error,
            other         => OperationResult::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            OperationResult::Ok       => Self::K_OK,
            OperationResult::Error    => Self::K_ERROR,
            OperationResult::Other(c) => c,
        }
    }

    #[inline]
    pub fn is_ok(self) -> bool {
        self == OperationResult::Ok
    }
}

// ── Options ──────────────────────────────────────────────────────────────────

/// Session-wide settings, fixed when the adapter is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub format:   ArchiveFormat,
    /// Updating an existing archive rather than creating a new one.
    pub attached: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self { format: ArchiveFormat::SevenZip, attached: false }
    }
}

impl UpdateOptions {
    /// A new archive written from scratch.
    pub fn create(format: ArchiveFormat) -> Self {
        Self { format, attached: false }
    }

    /// An update of an existing archive.
    pub fn update(format: ArchiveFormat) -> Self {
        Self { format, attached: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPhase {
    Unresolved,
    Resolved,
    Streaming,
    Reported,
}

// ── Adapter ──────────────────────────────────────────────────────────────────

pub struct UpdateCallbackAdapter<C: UpdateCallback> {
    callback:   C,
    archive:    ArchiveHandle,
    options:    UpdateOptions,
    cache:      ItemInfoCache<C::Item>,
    item_index: Option<u32>,
    phase:      ItemPhase,
    last_error: Option<BridgeError>,
    closed:     bool,
}

impl<C: UpdateCallback> UpdateCallbackAdapter<C> {
    pub fn new(callback: C, options: UpdateOptions) -> Self {
        Self::with_archive(callback, ArchiveHandle::new(options.format), options)
    }

    pub fn with_archive(callback: C, archive: ArchiveHandle, options: UpdateOptions) -> Self {
        debug_assert!(property::validate_table().is_ok(), "property table is inconsistent");
        debug!(archive = %archive.id, format = options.format.name(), attached = options.attached,
               "update session started");
        Self {
            callback,
            archive,
            options,
            cache:      ItemInfoCache::new(),
            item_index: None,
            phase:      ItemPhase::Unresolved,
            last_error: None,
            closed:     false,
        }
    }

    pub fn options(&self) -> &UpdateOptions { &self.options }

    pub fn archive(&self) -> &ArchiveHandle { &self.archive }

    pub fn callback(&self) -> &C { &self.callback }

    pub fn callback_mut(&mut self) -> &mut C { &mut self.callback }

    pub fn cache(&self) -> &ItemInfoCache<C::Item> { &self.cache }

    /// Phase of the item most recently addressed, with its index.
    pub fn phase(&self) -> (Option<u32>, ItemPhase) {
        (self.item_index, self.phase)
    }

    /// Error of the most recent failing engine call.
    pub fn last_error(&self) -> Option<&BridgeError> {
        self.last_error.as_ref()
    }

    /// End the session, releasing the pinned item-info object.
    pub fn close(mut self) -> Result<(), BridgeError> {
        self.closed = true;
        let mut crossing = Crossing::enter("Close");
        self.cache.release(&mut self.callback, &mut crossing)
    }

    // ── Internals ───────────────────────────────────────────────────────────

    fn record<T>(&mut self, result: Result<T, BridgeError>) -> Result<T, BridgeError> {
        if let Err(e) = &result {
            self.last_error = Some(e.clone());
        }
        result
    }

    fn resolve(&mut self, index: u32, crossing: &mut Crossing) -> Result<(), BridgeError> {
        if let Err(e) = self.cache.resolve(index, &mut self.callback, &self.archive, crossing) {
            self.item_index = None;
            self.phase = ItemPhase::Unresolved;
            return Err(e);
        }
        if self.item_index != Some(index) || self.phase == ItemPhase::Unresolved {
            self.item_index = Some(index);
            self.phase = ItemPhase::Resolved;
        }
        Ok(())
    }

    fn current_item(&self, index: u32) -> Result<&C::Item, BridgeError> {
        self.cache
            .current()
            .filter(|h| h.index() == index)
            .map(|h| h.item())
            .ok_or(BridgeError::NoItemInformation { index })
    }

    fn update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo, BridgeError> {
        let mut crossing = Crossing::enter("GetUpdateItemInfo");
        self.resolve(index, &mut crossing)?;
        // Item info opens a new round for this index, even if it is cached.
        self.phase = ItemPhase::Resolved;

        if !self.options.attached {
            return Ok(UpdateItemInfo::new_item());
        }

        let item = self.current_item(index)?;
        let new_data = required_flag(&mut crossing, item, Attribute::UpdateIsNewData, index)?;
        let new_properties = required_flag(&mut crossing, item, Attribute::UpdateIsNewProperties, index)?;

        let attr = Attribute::UpdateOldArchiveItemIndex;
        let index_in_archive = match crossing.call(attr.name(), || item.attribute(attr))? {
            Value::Null       => None,
            Value::Integer(i) => Some(i as u32).filter(|&i| i != NO_ARCHIVE_INDEX),
            other => {
                return Err(crossing.report(BridgeError::AttributeType {
                    attribute: attr,
                    index,
                    expected:  "integer",
                    found:     other.kind_name(),
                }))
            }
        };

        Ok(UpdateItemInfo { new_data, new_properties, index_in_archive })
    }

    fn property(
        &mut self,
        index: u32,
        prop:  PropId,
        value: Option<&mut PropVariant>,
    ) -> Result<(), BridgeError> {
        let mut crossing = Crossing::enter("GetProperty");
        let Some(out) = value else {
            return Ok(());
        };
        *out = PropVariant::Empty;

        if let Some(v) = property::format_override(prop, self.options.format) {
            trace!(index, %prop, "answered from format");
            *out = v;
            return Ok(());
        }

        let Some(desc) = property::descriptor(prop) else {
            if enabled!(Level::DEBUG) {
                for (id, name) in property::known_ids() {
                    debug!(id, name, "known property id");
                }
            }
            return Err(crossing.report(BridgeError::UnknownProperty(prop)));
        };

        self.resolve(index, &mut crossing)?;
        let item = self.current_item(index)?;
        let raw = crossing.call(desc.attribute.name(), || item.attribute(desc.attribute))?;

        match property::convert_value(desc.kind, raw) {
            ConversionOutcome::Absent => Ok(()),
            ConversionOutcome::Value(v) => {
                *out = v;
                Ok(())
            }
            ConversionOutcome::Failure(message) => {
                Err(crossing.report(BridgeError::Conversion { prop, index, message }))
            }
        }
    }

    fn stream(&mut self, index: u32) -> Result<NativeStream, BridgeError> {
        let mut crossing = Crossing::enter("GetStream");
        self.resolve(index, &mut crossing)?;

        let item = self.current_item(index)?;
        let attr = Attribute::DataStream;
        let source = match crossing.call(attr.name(), || item.attribute(attr))? {
            Value::Stream(s) => s,
            Value::Null => {
                return Err(crossing.report(BridgeError::NullAttribute { attribute: attr, index }))
            }
            other => {
                return Err(crossing.report(BridgeError::AttributeType {
                    attribute: attr,
                    index,
                    expected:  "stream",
                    found:     other.kind_name(),
                }))
            }
        };

        let stream = io_stream::select(source).map_err(|e| {
            crossing.report(BridgeError::StreamUnavailable { index, message: e.to_string() })
        })?;
        self.phase = ItemPhase::Streaming;
        Ok(stream)
    }

    fn operation_result(&mut self, result: OperationResult) -> Result<(), BridgeError> {
        let mut crossing = Crossing::enter("SetOperationResult");
        let ok = result.is_ok();
        if !ok {
            debug!(index = ?self.item_index, code = result.code(), "engine reported item failure");
        }
        crossing.call("setOperationResult", || self.callback.set_operation_result(ok))?;
        if self.item_index.is_some() {
            self.phase = ItemPhase::Reported;
        }
        Ok(())
    }
}

/// Read a boolean attribute that must be set.
fn required_flag<I: OutItem>(
    crossing: &mut Crossing,
    item:     &I,
    attr:     Attribute,
    index:    u32,
) -> Result<bool, BridgeError> {
    match crossing.call(attr.name(), || item.attribute(attr))? {
        Value::Boolean(b) => Ok(b),
        Value::Null => Err(crossing.report(BridgeError::NullAttribute { attribute: attr, index })),
        other => Err(crossing.report(BridgeError::AttributeType {
            attribute: attr,
            index,
            expected:  "boolean",
            found:     other.kind_name(),
        })),
    }
}

impl<C: UpdateCallback> ArchiveUpdateCallback for UpdateCallbackAdapter<C> {
    fn set_total(&mut self, total: u64) -> Result<(), BridgeError> {
        let mut crossing = Crossing::enter("SetTotal");
        let result = crossing.call("setTotal", || self.callback.set_total(total));
        self.record(result)
    }

    fn set_completed(&mut self, completed: u64) -> Result<(), BridgeError> {
        let mut crossing = Crossing::enter("SetCompleted");
        let result = crossing.call("setCompleted", || self.callback.set_completed(completed));
        self.record(result)
    }

    fn get_update_item_info(&mut self, index: u32) -> Result<UpdateItemInfo, BridgeError> {
        let result = self.update_item_info(index);
        self.record(result)
    }

    fn get_property(
        &mut self,
        index: u32,
        prop:  PropId,
        value: Option<&mut PropVariant>,
    ) -> Result<(), BridgeError> {
        let result = self.property(index, prop, value);
        self.record(result)
    }

    fn get_stream(&mut self, index: u32) -> Result<NativeStream, BridgeError> {
        let result = self.stream(index);
        self.record(result)
    }

    fn set_operation_result(&mut self, result: OperationResult) -> Result<(), BridgeError> {
        let result = self.operation_result(result);
        self.record(result)
    }
}

impl<C: UpdateCallback> Drop for UpdateCallbackAdapter<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let mut crossing = Crossing::enter("Drop");
        if let Err(e) = self.cache.release(&mut self.callback, &mut crossing) {
            warn!("releasing item information on teardown failed: {e}");
        }
    }
}
