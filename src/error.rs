//! Error taxonomy shared by all three engines.
//!
//! These are state-machine outcomes, not exceptional conditions: every
//! variant is a normal, expected return value on a hot path and none of
//! them are logged or retried by the crate itself (the caller decides).

use core::fmt;

/// Error kinds returned by the safe engine APIs.
///
/// The raw handle surface (used by the `ffi` feature) collapses these to
/// the null-pointer / nonzero-int conventions described in spec §6–§7:
/// `create` returns `None`/null on any variant, `alloc` returns `None`/null
/// on both [`AllocError::Exhausted`] and [`AllocError::InvalidArgs`], and
/// `free` returns this enum as a nonzero error code.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AllocError {
    /// A construction argument was zero, or a pointer argument was null.
    InvalidArgs,
    /// A backing buffer could not be obtained from the OS at construction.
    OutOfMemory,
    /// No capacity remains (no free blocks in a Slab, no bytes left in an
    /// Arena). Non-fatal: recoverable by `free` (Slab) or `reset` (Arena).
    Exhausted,
    /// The pointer passed to `free` is outside the buffer, misaligned to
    /// the block grid, out of range, or names a block that is already free
    /// or was never issued. Double-free falls in this variant, never UB.
    InvalidFree,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AllocError::InvalidArgs => "invalid arguments",
            AllocError::OutOfMemory => "backing buffer allocation failed",
            AllocError::Exhausted => "no capacity remains",
            AllocError::InvalidFree => "pointer was not a live allocation from this engine",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}
