//! Allocation statistics counters, gated behind the `stats` feature.
//!
//! All counters use `Relaxed` ordering — they are observational only and
//! are not used for synchronization. Each engine's own atomics provide the
//! ordering guarantees for correctness; these are purely for monitoring.
//! A [`Snapshot`] is not a globally consistent point-in-time view: fields
//! are loaded independently and may race with concurrent mutation.

use core::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Stats {
    pub slab_allocs: AtomicU64,
    pub slab_frees: AtomicU64,
    pub slab_free_rejections: AtomicU64,
    pub slab_exhausted: AtomicU64,

    pub arena_allocs: AtomicU64,
    pub arena_exhausted: AtomicU64,
    pub arena_resets: AtomicU64,

    pub pool_cache_hits: AtomicU64,
    pub pool_cache_misses: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            slab_allocs: AtomicU64::new(0),
            slab_frees: AtomicU64::new(0),
            slab_free_rejections: AtomicU64::new(0),
            slab_exhausted: AtomicU64::new(0),
            arena_allocs: AtomicU64::new(0),
            arena_exhausted: AtomicU64::new(0),
            arena_resets: AtomicU64::new(0),
            pool_cache_hits: AtomicU64::new(0),
            pool_cache_misses: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of all allocation statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct Snapshot {
    pub slab_allocs: u64,
    pub slab_frees: u64,
    pub slab_free_rejections: u64,
    pub slab_exhausted: u64,
    pub arena_allocs: u64,
    pub arena_exhausted: u64,
    pub arena_resets: u64,
    pub pool_cache_hits: u64,
    pub pool_cache_misses: u64,
}

/// Load all counters with `Relaxed` ordering and return a [`Snapshot`].
pub fn snapshot() -> Snapshot {
    let s = &STATS;
    Snapshot {
        slab_allocs: s.slab_allocs.load(Ordering::Relaxed),
        slab_frees: s.slab_frees.load(Ordering::Relaxed),
        slab_free_rejections: s.slab_free_rejections.load(Ordering::Relaxed),
        slab_exhausted: s.slab_exhausted.load(Ordering::Relaxed),
        arena_allocs: s.arena_allocs.load(Ordering::Relaxed),
        arena_exhausted: s.arena_exhausted.load(Ordering::Relaxed),
        arena_resets: s.arena_resets.load(Ordering::Relaxed),
        pool_cache_hits: s.pool_cache_hits.load(Ordering::Relaxed),
        pool_cache_misses: s.pool_cache_misses.load(Ordering::Relaxed),
    }
}
