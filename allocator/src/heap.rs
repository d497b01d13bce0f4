use core::{
    alloc::{GlobalAlloc, Layout},
    ptr::{null_mut, NonNull},
};

use spin::{Spin, SpinGuard};

use crate::free_list::{FreeListAllocator, HeapError, HeapStats, ALIGNMENT};

/// The free list allocator behind a spin lock, so tasks may allocate after multitasking begins.
pub struct LockedHeap {
    pub allocator: Spin<FreeListAllocator>,
}

impl LockedHeap {
    pub const fn empty() -> Self {
        Self {
            allocator: Spin::new(FreeListAllocator::empty()),
        }
    }

    pub fn lock(&self) -> SpinGuard<FreeListAllocator> {
        self.allocator.lock()
    }

    /// This function is unsafe because user has to make sure that [start, end) is valid memory used by nothing else.
    pub unsafe fn init(&self, start: usize, end: usize) -> Result<(), HeapError> {
        self.allocator.lock().init(start, end)
    }

    pub fn alloc(&self, size: usize) -> Result<NonNull<u8>, HeapError> {
        self.allocator.lock().alloc(size)
    }

    /// This function is unsafe because the pointer must come from this heap and must not be freed twice.
    pub unsafe fn free(&self, ptr: *mut u8) {
        self.allocator.lock().free(ptr);
    }

    pub fn stats(&self) -> HeapStats {
        self.allocator.lock().stats()
    }
}

impl Default for LockedHeap {
    fn default() -> Self {
        Self::empty()
    }
}

/// Only layouts aligned to at most [`ALIGNMENT`] are served; anything stricter gets null.
unsafe impl GlobalAlloc for LockedHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() > ALIGNMENT {
            return null_mut();
        }
        self.allocator
            .lock()
            .alloc(layout.size().max(1))
            .map_or(null_mut(), NonNull::as_ptr)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        self.allocator.lock().free(ptr);
    }
}
