//! Miri-compatible platform shim using `std::alloc` as the backing store.
//!
//! Miri can't execute real OS syscalls (mmap/VirtualAlloc), so we use the
//! system allocator to provide line-aligned memory. This lets Miri check
//! all the unsafe pointer logic in the engines' internals.

extern crate alloc;

use crate::config::LINE;
use core::alloc::Layout;

pub unsafe fn page_alloc(size: usize) -> *mut u8 {
    let Ok(layout) = Layout::from_size_align(size, LINE) else {
        return core::ptr::null_mut();
    };
    unsafe { alloc::alloc::alloc_zeroed(layout) }
}

pub unsafe fn page_dealloc(ptr: *mut u8, size: usize) {
    let layout = Layout::from_size_align(size, LINE).expect("size/align matches prior alloc");
    unsafe { alloc::alloc::dealloc(ptr, layout) };
}
