//! Bump-allocated arena: monotonically increasing offset, no per-allocation
//! free, bulk `reset` only.
//!
//! There is no free-list here at all — the whole point of an arena is that
//! individual deallocation is not supported. Callers that need individual
//! frees want [`crate::slab::Slab`] or [`crate::pool`] instead.

use crate::align;
use crate::error::AllocError;
use crate::macros::stat_inc;
use crate::platform;
use alloc::boxed::Box;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

/// A fixed-capacity bump allocator over one contiguous, `LINE`-aligned
/// buffer.
pub struct Arena {
    data: NonNull<u8>,
    capacity: usize,
    offset: AtomicUsize,
}

unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

/// Point-in-time occupancy of an [`Arena`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    pub used: usize,
    pub capacity: usize,
}

impl Arena {
    /// Reserve a `capacity`-byte buffer. `capacity` is rounded up to a
    /// multiple of [`crate::config::LINE`].
    pub fn create(capacity: usize) -> Result<Box<Arena>, AllocError> {
        if capacity == 0 {
            return Err(AllocError::InvalidArgs);
        }
        let capacity = align::round_up_size(capacity);

        let raw = unsafe { platform::page_alloc(capacity) };
        let Some(data) = NonNull::new(raw) else {
            return Err(AllocError::OutOfMemory);
        };

        Ok(Box::new(Arena {
            data,
            capacity,
            offset: AtomicUsize::new(0),
        }))
    }

    /// Bump-allocate `size` bytes, rounded up to a multiple of
    /// [`crate::config::LINE`]. Returns `None` if `size` is zero or the
    /// request would exceed the arena's remaining capacity.
    ///
    /// Fetch-and-add with a capacity guard: every call recomputes the new
    /// offset from whatever it last observed and only commits via CAS, so
    /// two concurrent winners never claim overlapping ranges.
    pub fn alloc(&self, size: usize) -> Option<NonNull<u8>> {
        #[cfg(feature = "debug")]
        log::trace!("arena alloc: size={size} capacity={}", self.capacity);
        if size == 0 {
            return None;
        }
        let aligned_size = align::round_up_size(size);

        let mut old_offset = self.offset.load(Ordering::Relaxed);
        loop {
            let new_offset = old_offset.checked_add(aligned_size)?;
            if new_offset > self.capacity {
                stat_inc!(arena_exhausted);
                return None;
            }

            match self.offset.compare_exchange_weak(
                old_offset,
                new_offset,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    stat_inc!(arena_allocs);
                    let ptr = unsafe { self.data.as_ptr().add(old_offset) };
                    return Some(unsafe { NonNull::new_unchecked(ptr) });
                }
                Err(observed) => old_offset = observed,
            }
        }
    }

    /// Rewind the bump offset to zero, making the whole buffer available
    /// again. No destructors run and no memory is re-zeroed; every pointer
    /// previously returned by `alloc` becomes dangling the instant any
    /// thread observes the reset. The caller is responsible for ensuring
    /// nothing still holds one.
    pub fn reset(&self) {
        #[cfg(feature = "debug")]
        log::trace!("arena reset: was at offset={}", self.offset.load(Ordering::Relaxed));
        self.offset.store(0, Ordering::Relaxed);
        stat_inc!(arena_resets);
    }

    /// Point-in-time occupancy.
    pub fn stats(&self) -> ArenaStats {
        ArenaStats {
            used: self.offset.load(Ordering::Relaxed).min(self.capacity),
            capacity: self.capacity,
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe { platform::page_dealloc(self.data.as_ptr(), self.capacity) };
    }
}
