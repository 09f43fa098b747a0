//! Thread-tiered pool: a per-thread free-block cache layered over a shared
//! [`crate::slab::Slab`] to keep the common case off the shared structure
//! entirely.
//!
//! Two cache strategies are available depending on the `std` feature:
//! - `std`: [`Pool::alloc`]/[`Pool::free`] key a `std::thread_local!`
//!   registry by the pool's own address, with a `Drop` guard that flushes
//!   a thread's cached blocks back to the Slab on thread exit.
//! - without `std`: [`Pool::worker`] hands out an explicit [`PoolWorker`]
//!   that the caller keeps one-per-thread, making the cache's lifetime
//!   visible in the type system instead of relying on OS TLS.

use crate::error::AllocError;
use crate::macros::stat_inc;
use crate::slab::{Slab, SlabStats};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::ptr::NonNull;

/// A thread's cached blocks, checked out from the shared Slab and not yet
/// handed back. Plain (non-atomic) fields: by construction only the owning
/// thread ever touches a given `Cache`.
struct Cache {
    slots: Vec<NonNull<u8>>,
    capacity: usize,
}

impl Cache {
    fn try_new(capacity: usize) -> Option<Cache> {
        let mut slots = Vec::new();
        if slots.try_reserve_exact(capacity).is_err() {
            return None;
        }
        Some(Cache { slots, capacity })
    }

    fn pop(&mut self) -> Option<NonNull<u8>> {
        self.slots.pop()
    }

    fn push(&mut self, ptr: NonNull<u8>) -> Result<(), NonNull<u8>> {
        if self.slots.len() < self.capacity {
            self.slots.push(ptr);
            Ok(())
        } else {
            Err(ptr)
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// A shared Slab with a per-thread cache tier in front of it.
pub struct Pool {
    slab: Slab,
    block_size: usize,
    blocks_per_thread: usize,
    total_blocks: usize,
}

impl Pool {
    /// Construct a pool backing a Slab of `(block_size, total_blocks)`,
    /// with each thread caching up to `blocks_per_thread` blocks. All three
    /// arguments must be nonzero.
    pub fn create(
        block_size: usize,
        blocks_per_thread: usize,
        total_blocks: usize,
    ) -> Result<Box<Pool>, AllocError> {
        if blocks_per_thread == 0 {
            return Err(AllocError::InvalidArgs);
        }
        let slab = *Slab::create(block_size, total_blocks)?;
        Ok(Box::new(Pool {
            slab,
            block_size,
            blocks_per_thread,
            total_blocks,
        }))
    }

    /// Forwards to the underlying Slab. Blocks currently parked in any
    /// thread's cache are counted as "allocated" here, since the Slab has
    /// no visibility into thread caches.
    pub fn stats(&self) -> SlabStats {
        self.slab.stats()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn blocks_per_thread(&self) -> usize {
        self.blocks_per_thread
    }

    pub fn total_blocks(&self) -> usize {
        self.total_blocks
    }

    fn alloc_tiered(&self, cache: Option<&mut Cache>) -> Option<NonNull<u8>> {
        if let Some(cache) = cache {
            if let Some(ptr) = cache.pop() {
                #[cfg(feature = "debug")]
                log::trace!("pool alloc: cache hit");
                stat_inc!(pool_cache_hits);
                return Some(ptr);
            }
        }
        #[cfg(feature = "debug")]
        log::trace!("pool alloc: cache miss, falling through to slab");
        stat_inc!(pool_cache_misses);
        self.slab.alloc()
    }

    fn free_tiered(&self, cache: Option<&mut Cache>, ptr: NonNull<u8>) -> Result<(), AllocError> {
        if let Some(cache) = cache {
            if cache.push(ptr).is_ok() {
                return Ok(());
            }
        }
        #[cfg(feature = "debug")]
        log::trace!("pool free: cache full, falling through to slab");
        self.slab.free(ptr)
    }
}

#[cfg(feature = "std")]
mod tls {
    use super::{Cache, Pool};
    use std::cell::RefCell;

    /// One thread's cache for one particular `Pool`, identified by the
    /// pool's address. A thread that uses several pools gets one entry per
    /// pool here.
    struct Entry {
        pool: *const Pool,
        cache: Cache,
    }

    /// Flushes every still-registered cache back to its pool's Slab when a
    /// thread exits.
    ///
    /// # Safety precondition
    /// Every `Pool` referenced here must still be alive when this runs.
    /// Hosts must quiesce a `Pool` (stop using it from every thread) before
    /// dropping it, so a `Pool` is never dropped while any thread that
    /// touched it is still running.
    struct Registry {
        entries: Vec<Entry>,
    }

    impl Drop for Registry {
        fn drop(&mut self) {
            for entry in self.entries.drain(..) {
                let pool = unsafe { &*entry.pool };
                let mut cache = entry.cache;
                while let Some(ptr) = cache.pop() {
                    let _ = pool.slab.free(ptr);
                }
            }
        }
    }

    std::thread_local! {
        static REGISTRY: RefCell<Registry> = RefCell::new(Registry { entries: Vec::new() });
    }

    /// Run `f` with this thread's cache for `pool`, lazily creating it on
    /// first use. `f` sees `None` if the cache failed to allocate, or if
    /// std's TLS is already torn down (the rare shutdown edge case); the
    /// caller falls through to the Slab in that case.
    pub(super) fn with_cache<R>(pool: &Pool, f: impl Fn(Option<&mut Cache>) -> R) -> R {
        let key = pool as *const Pool;
        let result = REGISTRY.try_with(|reg| {
            let mut reg = reg.borrow_mut();
            if let Some(pos) = reg.entries.iter().position(|e| e.pool == key) {
                return f(Some(&mut reg.entries[pos].cache));
            }
            match Cache::try_new(pool.blocks_per_thread()) {
                Some(cache) => {
                    reg.entries.push(Entry { pool: key, cache });
                    let last = reg.entries.len() - 1;
                    f(Some(&mut reg.entries[last].cache))
                }
                None => f(None),
            }
        });
        // `try_with` fails only if std's TLS destructor for this thread has
        // already run; fall straight through to the Slab in that case.
        match result {
            Ok(r) => r,
            Err(_) => f(None),
        }
    }

    pub(super) fn cache_len(pool: &Pool) -> usize {
        let key = pool as *const Pool;
        REGISTRY
            .try_with(|reg| {
                reg.borrow()
                    .entries
                    .iter()
                    .find(|e| e.pool == key)
                    .map_or(0, |e| e.cache.len())
            })
            .unwrap_or(0)
    }
}

#[cfg(feature = "std")]
impl Pool {
    /// Alloc through this thread's cache, falling through to the Slab on
    /// a cache miss.
    pub fn alloc(&self) -> Option<NonNull<u8>> {
        tls::with_cache(self, |cache| self.alloc_tiered(cache))
    }

    /// Free through this thread's cache, falling through to the Slab when
    /// the cache is already full.
    pub fn free(&self, ptr: NonNull<u8>) -> Result<(), AllocError> {
        tls::with_cache(self, |cache| self.free_tiered(cache, ptr))
    }

    /// Debug accessor: the calling thread's current cache occupancy.
    pub fn thread_cache_len(&self) -> usize {
        tls::cache_len(self)
    }
}

/// An explicit per-thread handle onto a [`Pool`], for use without the
/// `std` feature. The host constructs one per thread and must not share
/// it across threads — that invariant is exactly what makes the cache's
/// plain (non-atomic) fields sound.
#[cfg(not(feature = "std"))]
pub struct PoolWorker<'a> {
    pool: &'a Pool,
    cache: Option<Cache>,
}

#[cfg(not(feature = "std"))]
impl Pool {
    /// Create a worker handle for the calling thread. If the cache storage
    /// itself cannot be allocated, the worker degrades gracefully: every
    /// call falls straight through to the Slab.
    pub fn worker(&self) -> PoolWorker<'_> {
        PoolWorker {
            pool: self,
            cache: Cache::try_new(self.blocks_per_thread),
        }
    }
}

#[cfg(not(feature = "std"))]
impl<'a> PoolWorker<'a> {
    pub fn alloc(&mut self) -> Option<NonNull<u8>> {
        self.pool.alloc_tiered(self.cache.as_mut())
    }

    pub fn free(&mut self, ptr: NonNull<u8>) -> Result<(), AllocError> {
        self.pool.free_tiered(self.cache.as_mut(), ptr)
    }

    /// Debug accessor: this worker's current cache occupancy.
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, Cache::len)
    }
}

#[cfg(not(feature = "std"))]
impl Drop for PoolWorker<'_> {
    fn drop(&mut self) {
        if let Some(mut cache) = self.cache.take() {
            while let Some(ptr) = cache.pop() {
                let _ = self.pool.slab.free(ptr);
            }
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_zero_args() {
        assert_eq!(
            Pool::create(0, 4, 16).unwrap_err(),
            AllocError::InvalidArgs
        );
        assert_eq!(
            Pool::create(64, 0, 16).unwrap_err(),
            AllocError::InvalidArgs
        );
        assert_eq!(Pool::create(64, 4, 0).unwrap_err(), AllocError::InvalidArgs);
    }

    #[test]
    fn thread_cache_absorbs_steady_state_churn() {
        let pool = Pool::create(256, 100, 10_000).unwrap();

        let p = pool.alloc().unwrap();
        pool.free(p).unwrap();
        let before = pool.stats();

        for _ in 0..10_000 {
            let p = pool.alloc().unwrap();
            pool.free(p).unwrap();
        }

        assert_eq!(pool.stats(), before);
    }

    #[test]
    fn falls_through_to_slab_when_cache_full() {
        let pool = Pool::create(64, 2, 16).unwrap();
        let a = pool.alloc().unwrap();
        let b = pool.alloc().unwrap();
        let c = pool.alloc().unwrap();

        pool.free(a).unwrap();
        pool.free(b).unwrap();
        // cache (capacity 2) is now full; this one must go to the Slab.
        pool.free(c).unwrap();

        assert_eq!(pool.thread_cache_len(), 2);
    }

    #[test]
    fn each_thread_gets_its_own_cache() {
        use std::sync::Arc;

        let pool = Arc::new(*Pool::create(128, 4, 64).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let p = pool.alloc().unwrap();
                        pool.free(p).unwrap();
                    }
                    pool.thread_cache_len()
                })
            })
            .collect();

        for h in handles {
            assert!(h.join().unwrap() <= 4);
        }
    }
}
