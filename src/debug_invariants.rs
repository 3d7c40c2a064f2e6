//! Structural self-checks for index stores.
//!
//! Stores validate themselves after each mutation when built with
//! `debug_assertions` or the `check-invariants` feature; otherwise the checks
//! compile away. [`DebugInvariants::validate_invariants`] is always available
//! for tests and callers that want an explicit check.

use crate::cas_error::CasIndexError;

/// A store that can check its own ordering and uniqueness rules.
pub trait DebugInvariants {
    /// First violated invariant, if any.
    fn validate_invariants(&self) -> Result<(), CasIndexError>;

    /// Panic on a violated invariant when checks are enabled.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "invariant check failed");
    }
}

/// Run a `Result`-returning check and panic with `[invariants] <context>` on
/// error, only when checks are enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "check-invariants"))]
        if let Err(err) = $check {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), err);
        }
    };
}
