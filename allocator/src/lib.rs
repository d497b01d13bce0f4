#![cfg_attr(not(test), no_std)]

pub mod free_list;
pub mod heap;
pub mod linked_list;

pub use free_list::{Block, FreeListAllocator, HeapError, HeapStats, ALIGNMENT, HEADER_SIZE};
pub use heap::LockedHeap;
