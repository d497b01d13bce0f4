use core::ptr::NonNull;

use allocator::{HeapError, HeapStats, LockedHeap};

/// Everything between the end of the kernel image and the end of RAM.
#[cfg_attr(bare_metal, global_allocator)]
pub static KERNEL_HEAP: LockedHeap = LockedHeap::empty();

/// Hand the memory after the kernel image to [`KERNEL_HEAP`].
///
/// # Panics
///
/// Panics if the region can't hold a single block.
#[cfg(bare_metal)]
pub fn init_heap() {
    extern "C" {
        static HEAP_START: u8;
        static HEAP_END: u8;
    }
    let (start, end) = unsafe {
        (
            core::ptr::addr_of!(HEAP_START) as usize,
            core::ptr::addr_of!(HEAP_END) as usize,
        )
    };
    if let Err(err) = unsafe { KERNEL_HEAP.init(start, end) } {
        panic!("[heap] Can't manage {:#x}..{:#x}: {}.", start, end, err);
    }
    infoln!(
        "[heap] Managing {:#x}..{:#x}, {} bytes free.",
        start,
        end,
        KERNEL_HEAP.stats().free
    );
}

pub fn kalloc(size: usize) -> Result<NonNull<u8>, HeapError> {
    KERNEL_HEAP.alloc(size)
}

/// # Safety
///
/// `ptr` must come from [`kalloc`] and must not be freed twice.
pub unsafe fn kfree(ptr: *mut u8) {
    KERNEL_HEAP.free(ptr);
}

pub fn heap_stats() -> HeapStats {
    KERNEL_HEAP.stats()
}
