#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! rtalloc: a three-tier allocation subsystem.
//!
//! Three cooperating engines, leaves first:
//! - [`slab`] — a fixed-size block allocator over one contiguous buffer,
//!   served from a lock-free free-index stack.
//! - [`arena`] — a bump allocator over one contiguous buffer, released
//!   only in bulk via `reset`.
//! - [`pool`] — a per-thread free-block cache layered over an owned
//!   [`slab::Slab`], keeping the common case off the shared structure.
//!
//! [`align`] holds the pure alignment helpers all three build on.
//!
//! # Usage
//!
//! ```no_run
//! let slab = rtalloc::Slab::create(64, 1024)?;
//! let block = slab.alloc().expect("slab not exhausted");
//! slab.free(block)?;
//! # Ok::<(), rtalloc::AllocError>(())
//! ```

extern crate alloc;

pub mod align;
pub mod arena;
pub mod config;
pub mod error;
#[cfg(feature = "ffi")]
pub mod ffi;
pub(crate) mod macros;
pub mod platform;
pub mod pool;
pub mod slab;
#[cfg(feature = "stats")]
pub mod stats;

pub use align::{is_aligned, padding, round_up_addr, round_up_size};
pub use arena::{Arena, ArenaStats};
pub use config::LINE;
pub use error::AllocError;
pub use pool::Pool;
pub use slab::{Slab, SlabStats};

#[cfg(not(feature = "std"))]
pub use pool::PoolWorker;

// Panic handler for staticlib builds (no_std has no default panic handler).
// Only active when panic="abort" (i.e., the `fast` profile), not during normal checks.
#[cfg(all(feature = "ffi", not(test), not(feature = "std"), panic = "abort"))]
#[panic_handler]
fn panic(_: &core::panic::PanicInfo) -> ! {
    unsafe extern "C" {
        fn abort() -> !;
    }
    unsafe { abort() }
}
