//! Item info cache: the single pinned item-info object of an update session.
//!
//! The engine asks several questions about the same item in a row, so the
//! item-info object for the last index is kept and reused.  Asking about a
//! different index releases the held object first, then fetches the new one.
//!
//! The slot holds at most one item.  This relies on the engine finishing one
//! item before moving to the next; interleaved queries across indices still
//! work but cost a release and a fetch on every switch.

use tracing::debug;

use crate::bridge::{BridgeError, Crossing};
use crate::managed::{ArchiveHandle, UpdateCallback};

/// A pinned item-info object together with the index it describes.
#[derive(Debug)]
pub struct UpdateItemHandle<I> {
    index: u32,
    item:  I,
}

impl<I> UpdateItemHandle<I> {
    pub fn index(&self) -> u32 { self.index }

    pub fn item(&self) -> &I { &self.item }
}

#[derive(Debug)]
pub struct ItemInfoCache<I> {
    slot:        Option<UpdateItemHandle<I>>,
    resolutions: u64,
    releases:    u64,
}

impl<I> Default for ItemInfoCache<I> {
    fn default() -> Self {
        Self { slot: None, resolutions: 0, releases: 0 }
    }
}

impl<I> ItemInfoCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&UpdateItemHandle<I>> {
        self.slot.as_ref()
    }

    pub fn current_index(&self) -> Option<u32> {
        self.slot.as_ref().map(|h| h.index)
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Item-info objects fetched from the managed side so far.
    pub fn resolutions(&self) -> u64 { self.resolutions }

    /// Item-info objects released so far.
    pub fn releases(&self) -> u64 { self.releases }

    /// Return the item-info object for `index`, fetching it if the slot holds
    /// a different index or nothing.
    ///
    /// On any failure the slot is left empty.
    pub fn resolve<C>(
        &mut self,
        index:    u32,
        callback: &mut C,
        archive:  &ArchiveHandle,
        crossing: &mut Crossing,
    ) -> Result<&UpdateItemHandle<I>, BridgeError>
    where
        C: UpdateCallback<Item = I>,
    {
        if self.current_index() == Some(index) {
            debug!(index, "item information cached");
        } else {
            self.release(callback, crossing)?;
            let handle = self.fetch(index, callback, archive, crossing)?;
            self.slot = Some(handle);
        }
        self.slot
            .as_ref()
            .ok_or(BridgeError::NoItemInformation { index })
    }

    /// Hand the held item back to the managed side and unpin it.
    ///
    /// The pin is dropped even when the managed `free_resources` hook faults;
    /// the fault is returned as this release's own error.
    pub fn release<C>(&mut self, callback: &mut C, crossing: &mut Crossing) -> Result<(), BridgeError>
    where
        C: UpdateCallback<Item = I>,
    {
        let Some(handle) = self.slot.take() else {
            return Ok(());
        };
        self.releases += 1;
        debug!(index = handle.index, "releasing item information");
        crossing.call("freeResources", || callback.free_resources(handle.index, &handle.item))
    }

    fn fetch<C>(
        &mut self,
        index:    u32,
        callback: &mut C,
        archive:  &ArchiveHandle,
        crossing: &mut Crossing,
    ) -> Result<UpdateItemHandle<I>, BridgeError>
    where
        C: UpdateCallback<Item = I>,
    {
        let factory = crossing.call("OutItemFactory.new", || callback.item_factory(archive, index))?;
        let item = crossing.call("getItemInformation", || {
            callback.get_item_information(index, factory)
        })?;
        let Some(item) = item else {
            return Err(crossing.report(BridgeError::NoItemInformation { index }));
        };
        self.resolutions += 1;
        debug!(index, "item information fetched");
        Ok(UpdateItemHandle { index, item })
    }
}
