//! Error bridge: every call into the managed side goes through a
//! [`Crossing`].
//!
//! A `Crossing` lives for exactly one engine-facing call.  The first managed
//! fault it sees is latched; the value that came with it is discarded, and
//! every later crossing in the same engine call is refused without touching
//! the managed side.  Faults therefore never need unwinding: they travel as a
//! plain [`BridgeError`] through `?` back to the engine, where
//! [`BridgeError::status`] turns them into a native status code.

use thiserror::Error;
use tracing::{error, trace, warn};

use crate::managed::{Attribute, ManagedFault};
use crate::property::PropId;
use crate::status;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A required attribute was null.
    #[error("The attribute '{attribute}' of the item information object must not be null (index={index})")]
    NullAttribute { attribute: Attribute, index: u32 },

    /// The engine asked for a property outside the descriptor table.
    #[error("Unexpected property id {0}")]
    UnknownProperty(PropId),

    /// The managed callback returned no item-info object.
    #[error("Callback produced no item information (index={index}); \
             use the item factory to create one and fill it in")]
    NoItemInformation { index: u32 },

    /// A present value could not be converted to its native representation.
    #[error("Property {prop} of item {index} could not be converted: {message}")]
    Conversion { prop: PropId, index: u32, message: String },

    /// A non-property attribute held a value of the wrong kind.
    #[error("The attribute '{attribute}' (index={index}) must be a {expected}, found {found}")]
    AttributeType { attribute: Attribute, index: u32, expected: &'static str, found: &'static str },

    /// The data source could not be wrapped for the engine.
    #[error("Data stream of item {index} is unavailable: {message}")]
    StreamUnavailable { index: u32, message: String },

    /// The managed side raised a fault during a crossing.
    #[error("Managed call {crossing} failed in {entry}: {fault}")]
    Fault { entry: &'static str, crossing: &'static str, fault: ManagedFault },

    /// A crossing was refused because an earlier one in the same call faulted.
    #[error("Managed call {crossing} skipped in {entry}: an earlier fault is pending")]
    Latched { entry: &'static str, crossing: &'static str },
}

impl BridgeError {
    /// Native status code reported to the engine.
    pub fn status(&self) -> i32 {
        status::S_FALSE
    }

    /// The managed side broke the adapter's contract (as opposed to faulting).
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            BridgeError::NullAttribute { .. }
                | BridgeError::UnknownProperty(_)
                | BridgeError::NoItemInformation { .. }
                | BridgeError::AttributeType { .. }
        )
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, BridgeError::Fault { .. } | BridgeError::Latched { .. })
    }

    /// The managed fault behind this error, if any.
    pub fn fault(&self) -> Option<&ManagedFault> {
        match self {
            BridgeError::Fault { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

// ── Crossing ─────────────────────────────────────────────────────────────────

/// Fault latch scoped to one engine-facing call.
#[derive(Debug)]
pub struct Crossing {
    entry: &'static str,
    fault: Option<ManagedFault>,
    calls: u32,
}

impl Crossing {
    pub fn enter(entry: &'static str) -> Self {
        trace!(entry, "engine call");
        Self { entry, fault: None, calls: 0 }
    }

    /// Run one managed call.
    pub fn call<T>(
        &mut self,
        crossing: &'static str,
        f: impl FnOnce() -> Result<T, ManagedFault>,
    ) -> Result<T, BridgeError> {
        if self.fault.is_some() {
            return Err(BridgeError::Latched { entry: self.entry, crossing });
        }
        self.calls += 1;
        match f() {
            Ok(v) => Ok(v),
            Err(fault) => {
                warn!(entry = self.entry, crossing, %fault, "managed fault");
                self.fault = Some(fault.clone());
                Err(BridgeError::Fault { entry: self.entry, crossing, fault })
            }
        }
    }

    /// Log a contract violation detected on the native side and hand it back.
    pub fn report(&self, err: BridgeError) -> BridgeError {
        error!(entry = self.entry, "{err}");
        err
    }

    /// Managed calls actually made (refused calls are not counted).
    pub fn calls(&self) -> u32 { self.calls }

    pub fn is_faulted(&self) -> bool { self.fault.is_some() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_is_sticky_within_one_call() {
        let mut crossing = Crossing::enter("GetProperty");
        let mut reached = 0;

        let first: Result<u32, _> = crossing.call("first", || {
            reached += 1;
            Err(ManagedFault::new("boom"))
        });
        assert!(matches!(first, Err(BridgeError::Fault { crossing: "first", .. })));

        let second = crossing.call("second", || {
            reached += 1;
            Ok(7)
        });
        assert_eq!(
            second,
            Err(BridgeError::Latched { entry: "GetProperty", crossing: "second" })
        );
        assert_eq!(reached, 1);
        assert_eq!(crossing.calls(), 1);
        assert!(crossing.is_faulted());
    }

    #[test]
    fn fresh_crossing_starts_clean() {
        let mut crossing = Crossing::enter("GetStream");
        assert_eq!(crossing.call("ok", || Ok::<_, ManagedFault>(1)), Ok(1));
        assert_eq!(crossing.call("ok", || Ok::<_, ManagedFault>(2)), Ok(2));
        assert_eq!(crossing.calls(), 2);
        assert!(!crossing.is_faulted());
    }

    #[test]
    fn every_error_maps_to_s_false() {
        let errs = [
            BridgeError::UnknownProperty(PropId(9999)),
            BridgeError::NoItemInformation { index: 3 },
            BridgeError::Latched { entry: "x", crossing: "y" },
        ];
        for e in &errs {
            assert_eq!(e.status(), status::S_FALSE);
        }
        assert!(errs[0].is_protocol_violation());
        assert!(errs[2].is_fault());
    }
}
