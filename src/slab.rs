//! Fixed-size block allocator: a pre-sized arena of uniform blocks served
//! from a lock-free free-index stack.
//!
//! Exactly one size class per instance, no span/central-cache machinery:
//! callers wanting several block sizes create several `Slab`s. There is no
//! dynamic growth. `create` reserves the whole backing buffer up front and
//! `alloc`/`free` only ever move block indices between "checked out" and
//! "on the free stack".

use crate::align;
use crate::error::AllocError;
use crate::macros::stat_inc;
use crate::platform;
use alloc::boxed::Box;
use core::ptr::NonNull;
use core::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};

/// Sentinel marking a free-list slot whose value has been claimed (by a
/// `compare_exchange` on `free_top`) but not yet published by the writer.
/// Never a valid block index because `num_blocks` is always `< SLOT_EMPTY`
/// (both are `usize`, and a slab large enough to exhaust `usize::MAX`
/// blocks could never be backed by a real buffer).
const SLOT_EMPTY: usize = usize::MAX;

const FREE_TAG: u64 = 0xF5EE_B10C_F5EE_B10C;
const ALLOC_TAG: u64 = 0xA110_C8ED_A110_C8ED;

/// Per-block bookkeeping, one entry per block index.
struct BlockMeta {
    /// `FREE_TAG` or `ALLOC_TAG`. A structural debug aid, not a security
    /// token — the bits live in memory the caller can corrupt.
    magic: AtomicU64,
    /// 1 if free, 0 if allocated. Atomic alongside `magic` purely to avoid
    /// torn reads under false sharing with neighboring blocks; ordering is
    /// already established by the free-list claim, not by these fields.
    free: AtomicU8,
    /// Redundant copy of this entry's own index, for structural validation.
    index: usize,
}

/// A fixed-size block allocator over one contiguous, `LINE`-aligned buffer.
///
/// `free_top` is the stack depth of `free_list`, `free_count` mirrors it
/// for `stats`, and every block is exactly one of "on the free stack" or
/// "checked out".
pub struct Slab {
    data: NonNull<u8>,
    data_len: usize,
    block_size: usize,
    num_blocks: usize,
    metadata: Box<[BlockMeta]>,
    free_list: Box<[AtomicUsize]>,
    free_top: AtomicUsize,
    free_count: AtomicUsize,
}

// SAFETY: all mutable state is behind atomics; `data` points to a buffer
// this `Slab` exclusively owns for its lifetime.
unsafe impl Send for Slab {}
unsafe impl Sync for Slab {}

/// Point-in-time occupancy of a [`Slab`]. May be stale under concurrent
/// mutation; this is a monitoring counter, not a synchronization point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SlabStats {
    pub used: usize,
    pub free: usize,
}

impl Slab {
    /// Reserve a buffer for `num_blocks` blocks of `block_size` bytes each
    /// (rounded up to a multiple of [`crate::config::LINE`], with a
    /// minimum of one line). All blocks start free.
    pub fn create(block_size: usize, num_blocks: usize) -> Result<Box<Slab>, AllocError> {
        if block_size == 0 || num_blocks == 0 {
            return Err(AllocError::InvalidArgs);
        }

        let aligned_block_size = align::round_up_size(block_size.max(1));
        let data_len = aligned_block_size
            .checked_mul(num_blocks)
            .ok_or(AllocError::OutOfMemory)?;

        let raw = unsafe { platform::page_alloc(data_len) };
        let Some(data) = NonNull::new(raw) else {
            return Err(AllocError::OutOfMemory);
        };

        let metadata: Box<[BlockMeta]> = (0..num_blocks)
            .map(|index| BlockMeta {
                magic: AtomicU64::new(FREE_TAG),
                free: AtomicU8::new(1),
                index,
            })
            .collect();

        // All blocks start free; the free list is the identity permutation
        // and every slot is already "published" (no concurrent claimant
        // exists yet, so there's nothing to race against here).
        let free_list: Box<[AtomicUsize]> =
            (0..num_blocks).map(AtomicUsize::new).collect();

        Ok(Box::new(Slab {
            data,
            data_len,
            block_size: aligned_block_size,
            num_blocks,
            metadata,
            free_list,
            free_top: AtomicUsize::new(num_blocks),
            free_count: AtomicUsize::new(num_blocks),
        }))
    }

    #[inline]
    fn block_addr(&self, index: usize) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(self.data.as_ptr().add(index * self.block_size)) }
    }

    /// Pop the top of the free-index stack and mark that block allocated.
    /// Returns `None` when no free block is available.
    pub fn alloc(&self) -> Option<NonNull<u8>> {
        #[cfg(feature = "debug")]
        log::trace!("slab alloc: block_size={} num_blocks={}", self.block_size, self.num_blocks);
        loop {
            let old_top = self.free_top.load(Ordering::Acquire);
            if old_top == 0 {
                stat_inc!(slab_exhausted);
                return None;
            }
            let new_top = old_top - 1;
            if self
                .free_top
                .compare_exchange_weak(old_top, new_top, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }

            // We now exclusively own slot `new_top`. A concurrent `free`
            // may be mid-write to this exact slot (see module docs on the
            // push/pop race); spin until its value is published.
            let index = loop {
                let v = self.free_list[new_top].swap(SLOT_EMPTY, Ordering::Acquire);
                if v != SLOT_EMPTY {
                    break v;
                }
                core::hint::spin_loop();
            };

            let meta = &self.metadata[index];
            meta.magic.store(ALLOC_TAG, Ordering::Relaxed);
            meta.free.store(0, Ordering::Relaxed);
            self.free_count.fetch_sub(1, Ordering::Relaxed);
            stat_inc!(slab_allocs);
            return Some(self.block_addr(index));
        }
    }

    /// Recover a block index from a pointer, rejecting anything not
    /// exactly on this slab's block grid.
    fn index_of(&self, ptr: NonNull<u8>) -> Result<usize, AllocError> {
        let base = self.data.as_ptr() as usize;
        let addr = ptr.as_ptr() as usize;
        if addr < base {
            return Err(AllocError::InvalidFree);
        }
        let offset = addr - base;
        if offset >= self.data_len || offset % self.block_size != 0 {
            return Err(AllocError::InvalidFree);
        }
        let index = offset / self.block_size;
        if index >= self.num_blocks {
            return Err(AllocError::InvalidFree);
        }
        Ok(index)
    }

    /// Validate, mark free, and push the block's index back onto the
    /// free-index stack.
    pub fn free(&self, ptr: NonNull<u8>) -> Result<(), AllocError> {
        #[cfg(feature = "debug")]
        log::trace!("slab free: ptr={:p}", ptr.as_ptr());
        let index = self.index_of(ptr)?;
        let meta = &self.metadata[index];
        debug_assert_eq!(meta.index, index);

        if meta.magic.load(Ordering::Relaxed) != ALLOC_TAG || meta.free.load(Ordering::Relaxed) != 0
        {
            #[cfg(feature = "debug")]
            log::trace!("slab free rejected: ptr={:p} index={}", ptr.as_ptr(), index);
            stat_inc!(slab_free_rejections);
            return Err(AllocError::InvalidFree);
        }

        meta.magic.store(FREE_TAG, Ordering::Relaxed);
        meta.free.store(1, Ordering::Relaxed);

        loop {
            let old_top = self.free_top.load(Ordering::Relaxed);
            debug_assert!(old_top < self.num_blocks);
            if self
                .free_top
                .compare_exchange_weak(old_top, old_top + 1, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            // Exclusively own slot `old_top`; publish the index with
            // Release so a concurrent `alloc`'s Acquire swap observes it.
            self.free_list[old_top].store(index, Ordering::Release);
            break;
        }

        self.free_count.fetch_add(1, Ordering::Relaxed);
        stat_inc!(slab_frees);
        Ok(())
    }

    /// Point-in-time occupancy. May be stale under concurrent mutation.
    pub fn stats(&self) -> SlabStats {
        let free = self.free_count.load(Ordering::Relaxed);
        SlabStats {
            used: self.num_blocks - free,
            free,
        }
    }

    /// Total number of blocks this slab was created with.
    pub fn capacity(&self) -> usize {
        self.num_blocks
    }
}

impl Drop for Slab {
    fn drop(&mut self) {
        unsafe { platform::page_dealloc(self.data.as_ptr(), self.data_len) };
    }
}
