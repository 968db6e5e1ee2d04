//! Native status codes returned across the engine-facing contract.
//!
//! The engine speaks COM-style `HRESULT`s.  Only `S_OK` means success; every
//! other value is a failure for that single call, and the engine alone
//! decides whether to abort the whole update or skip the item.
//!
//! # Stability contract
//! - The numeric values are fixed by the engine and never change.
//! - The adapter reports every failure as `S_FALSE`, matching the engine's
//!   convention for "callback refused".  The `E_*` values exist so callers
//!   can recognise codes produced by other components of the engine.

use crate::bridge::BridgeError;

/// Success.
pub const S_OK:         i32 = 0;
/// Generic callback failure.  The adapter's only failure code.
pub const S_FALSE:      i32 = 1;
/// Unspecified engine failure.
pub const E_FAIL:       i32 = 0x8000_4005_u32 as i32;
/// Invalid argument.
pub const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;
/// Operation not implemented.
pub const E_NOTIMPL:    i32 = 0x8000_4001_u32 as i32;

/// Collapse an engine-facing result into the status code the engine sees.
pub fn of<T>(result: &Result<T, BridgeError>) -> i32 {
    match result {
        Ok(_)  => S_OK,
        Err(e) => e.status(),
    }
}

/// Name of a known status code (diagnostics only).
pub fn name(code: i32) -> &'static str {
    match code {
        S_OK         => "S_OK",
        S_FALSE      => "S_FALSE",
        E_FAIL       => "E_FAIL",
        E_INVALIDARG => "E_INVALIDARG",
        E_NOTIMPL    => "E_NOTIMPL",
        _            => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_named() {
        assert_eq!(name(S_FALSE), "S_FALSE");
        assert_eq!(name(E_INVALIDARG), "E_INVALIDARG");
        assert_eq!(name(0x7777), "UNKNOWN");
        assert_eq!(of(&Ok::<_, BridgeError>(())), S_OK);
    }
}
