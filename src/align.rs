//! Cache-line alignment primitives used by all three engines.
//!
//! Every user-visible allocation from the Slab, Arena, and Pool engines is
//! aligned to [`crate::config::LINE`] bytes, and every block-size input is
//! rounded up to a multiple of it. These four functions are the only place
//! that rounding logic lives.

use crate::config::LINE;

const _: () = assert!(LINE.is_power_of_two() && LINE > 0, "LINE must be a nonzero power of two");

/// Round `addr` up to the next multiple of [`LINE`]. Idempotent on already
/// aligned addresses.
#[inline]
pub const fn round_up_addr(addr: usize) -> usize {
    (addr + LINE - 1) & !(LINE - 1)
}

/// Round `size` up to the next multiple of [`LINE`]. A zero `size` rounds
/// up to `0`; callers that must reject zero-size requests check that before
/// calling this.
#[inline]
pub const fn round_up_size(size: usize) -> usize {
    (size + LINE - 1) & !(LINE - 1)
}

/// Bytes of padding needed to bring `addr` up to the next [`LINE`] boundary.
#[inline]
pub const fn padding(addr: usize) -> usize {
    round_up_addr(addr) - addr
}

/// Whether `addr` already sits on a [`LINE`] boundary.
#[inline]
pub const fn is_aligned(addr: usize) -> bool {
    addr & (LINE - 1) == 0
}
