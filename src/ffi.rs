//! C-ABI exports for host programs that want a raw handle-based surface
//! instead of the safe Rust API.
//!
//! Gated behind `features = ["ffi"]`. Every `create` returns null on
//! failure; every `alloc` returns null on exhaustion; `free`/`stats`
//! return `0` on success and a nonzero [`crate::error::AllocError`]
//! discriminant-plus-one on failure (0 is reserved for success so callers
//! can `if ret != 0`).

use crate::arena::Arena;
use crate::error::AllocError;
use crate::pool::Pool;
use crate::slab::Slab;
use alloc::boxed::Box;
use core::ptr::NonNull;

fn err_code(e: AllocError) -> i32 {
    match e {
        AllocError::InvalidArgs => 1,
        AllocError::OutOfMemory => 2,
        AllocError::Exhausted => 3,
        AllocError::InvalidFree => 4,
    }
}

// --- Slab ---

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_slab_create(block_size: usize, num_blocks: usize) -> *mut Slab {
    match Slab::create(block_size, num_blocks) {
        Ok(slab) => Box::into_raw(slab),
        Err(_) => core::ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_slab_alloc(h: *mut Slab) -> *mut u8 {
    let Some(slab) = (unsafe { h.as_ref() }) else {
        return core::ptr::null_mut();
    };
    slab.alloc().map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_slab_free(h: *mut Slab, ptr: *mut u8) -> i32 {
    let (Some(slab), Some(ptr)) = (unsafe { h.as_ref() }, NonNull::new(ptr)) else {
        return err_code(AllocError::InvalidArgs);
    };
    match slab.free(ptr) {
        Ok(()) => 0,
        Err(e) => err_code(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_slab_destroy(h: *mut Slab) {
    if !h.is_null() {
        drop(unsafe { Box::from_raw(h) });
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_slab_stats(h: *mut Slab, used: *mut usize, free: *mut usize) -> i32 {
    let (Some(slab), false) = (unsafe { h.as_ref() }, used.is_null() || free.is_null()) else {
        return err_code(AllocError::InvalidArgs);
    };
    let stats = slab.stats();
    unsafe {
        *used = stats.used;
        *free = stats.free;
    }
    0
}

// --- Arena ---

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_arena_create(capacity: usize) -> *mut Arena {
    match Arena::create(capacity) {
        Ok(arena) => Box::into_raw(arena),
        Err(_) => core::ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_arena_alloc(h: *mut Arena, size: usize) -> *mut u8 {
    let Some(arena) = (unsafe { h.as_ref() }) else {
        return core::ptr::null_mut();
    };
    arena.alloc(size).map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_arena_reset(h: *mut Arena) {
    if let Some(arena) = unsafe { h.as_ref() } {
        arena.reset();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_arena_destroy(h: *mut Arena) {
    if !h.is_null() {
        drop(unsafe { Box::from_raw(h) });
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_arena_stats(
    h: *mut Arena,
    used: *mut usize,
    capacity: *mut usize,
) -> i32 {
    let (Some(arena), false) = (unsafe { h.as_ref() }, used.is_null() || capacity.is_null())
    else {
        return err_code(AllocError::InvalidArgs);
    };
    let stats = arena.stats();
    unsafe {
        *used = stats.used;
        *capacity = stats.capacity;
    }
    0
}

// --- Pool ---

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_pool_create(
    block_size: usize,
    blocks_per_thread: usize,
    total_blocks: usize,
) -> *mut Pool {
    match Pool::create(block_size, blocks_per_thread, total_blocks) {
        Ok(pool) => Box::into_raw(pool),
        Err(_) => core::ptr::null_mut(),
    }
}

#[cfg(feature = "std")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_pool_alloc(h: *mut Pool) -> *mut u8 {
    let Some(pool) = (unsafe { h.as_ref() }) else {
        return core::ptr::null_mut();
    };
    pool.alloc().map_or(core::ptr::null_mut(), NonNull::as_ptr)
}

#[cfg(feature = "std")]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_pool_free(h: *mut Pool, ptr: *mut u8) -> i32 {
    let (Some(pool), Some(ptr)) = (unsafe { h.as_ref() }, NonNull::new(ptr)) else {
        return err_code(AllocError::InvalidArgs);
    };
    match pool.free(ptr) {
        Ok(()) => 0,
        Err(e) => err_code(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_pool_destroy(h: *mut Pool) {
    if !h.is_null() {
        drop(unsafe { Box::from_raw(h) });
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rtalloc_pool_stats(
    h: *mut Pool,
    allocated: *mut usize,
    free: *mut usize,
) -> i32 {
    let (Some(pool), false) = (unsafe { h.as_ref() }, allocated.is_null() || free.is_null())
    else {
        return err_code(AllocError::InvalidArgs);
    };
    let stats = pool.stats();
    unsafe {
        *allocated = stats.used;
        *free = stats.free;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slab_round_trip_through_raw_handles() {
        unsafe {
            let h = rtalloc_slab_create(64, 4);
            assert!(!h.is_null());
            let p = rtalloc_slab_alloc(h);
            assert!(!p.is_null());
            assert_eq!(rtalloc_slab_free(h, p), 0);
            assert_eq!(rtalloc_slab_free(h, p), err_code(AllocError::InvalidFree));
            rtalloc_slab_destroy(h);
        }
    }

    #[test]
    fn slab_create_zero_args_returns_null() {
        unsafe {
            assert!(rtalloc_slab_create(0, 4).is_null());
        }
    }

    #[test]
    fn arena_round_trip_through_raw_handles() {
        unsafe {
            let h = rtalloc_arena_create(256);
            assert!(!h.is_null());
            let mut used = 0usize;
            let mut capacity = 0usize;
            assert_eq!(rtalloc_arena_stats(h, &mut used, &mut capacity), 0);
            assert_eq!(used, 0);
            assert!(!rtalloc_arena_alloc(h, 64).is_null());
            rtalloc_arena_reset(h);
            rtalloc_arena_destroy(h);
        }
    }
}
