use core::{
    fmt,
    mem::size_of,
    ptr::{self, NonNull},
};

use crate::linked_list::{LinkedList, ListNode};

/// Every payload starts on this boundary and every size is rounded up to it.
pub const ALIGNMENT: usize = 8;

/// The smallest payload worth carving off as a separate free block.
pub const MIN_PAYLOAD: usize = ALIGNMENT;

pub const HEADER_SIZE: usize = size_of::<BlockHeader>();

/// Bookkeeping placed immediately before each payload.
#[repr(C, align(8))]
struct BlockHeader {
    node: ListNode,
    /// Address of the first payload byte, namely the end of this header.
    start: usize,
    /// Payload size in bytes.
    size: usize,
}

impl BlockHeader {
    unsafe fn write(addr: usize, size: usize) -> *mut BlockHeader {
        let header = addr as *mut BlockHeader;
        ptr::write(
            header,
            BlockHeader {
                node: ListNode::new(),
                start: addr + HEADER_SIZE,
                size,
            },
        );
        header
    }

    fn from_node(node: *mut ListNode) -> *mut BlockHeader {
        node as *mut BlockHeader
    }

    fn node(header: *mut BlockHeader) -> *mut ListNode {
        header as *mut ListNode
    }

    fn end(&self) -> usize {
        self.start + self.size
    }
}

const fn align_up(addr: usize) -> usize {
    (addr + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

const fn align_down(addr: usize) -> usize {
    addr & !(ALIGNMENT - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeapError {
    /// The aligned region can't even hold one header.
    HeapTooSmall,
    /// No free block satisfies the request.
    NoSpace,
    /// Zero bytes were requested.
    ZeroSize,
}

impl HeapError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HeapTooSmall => "heap is too small",
            Self::NoSpace => "no free block is large enough",
            Self::ZeroSize => "zero-sized allocation",
        }
    }
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A snapshot of one block, as seen by the iterators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub header: usize,
    pub start: usize,
    pub size: usize,
}

impl Block {
    pub fn end(&self) -> usize {
        self.start + self.size
    }

    fn from_node(node: *mut ListNode) -> Self {
        let header = BlockHeader::from_node(node);
        unsafe {
            Self {
                header: header as usize,
                start: (*header).start,
                size: (*header).size,
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeapStats {
    /// Bytes between the first header and the aligned end of the heap.
    pub total: usize,
    /// Payload bytes handed out, including slack of unsplit blocks.
    pub allocated: usize,
    /// Payload bytes on the free list.
    pub free: usize,
    pub allocated_blocks: usize,
    pub free_blocks: usize,
}

/// A first-fit allocator over one contiguous region.
///
/// Both the free list and the allocated list thread through headers inside the region. The free
/// list is kept sorted by address and never holds two address-adjacent blocks, so a single merge
/// with each neighbour on free is enough to keep it fully coalesced.
///
/// Nothing in here locks. Wrap it in a [`crate::LockedHeap`] when it's shared.
pub struct FreeListAllocator {
    free: LinkedList,
    allocated: LinkedList,
    start: usize,
    end: usize,
}

unsafe impl Send for FreeListAllocator {}

impl FreeListAllocator {
    pub const fn empty() -> Self {
        Self {
            free: LinkedList::new(),
            allocated: LinkedList::new(),
            start: 0,
            end: 0,
        }
    }

    /// Create an allocator managing [start, end).
    ///
    /// This function is unsafe because user has to make sure that the range is valid, writable and used by nothing else.
    pub unsafe fn new(start: usize, end: usize) -> Result<Self, HeapError> {
        let mut allocator = Self::empty();
        allocator.init(start, end)?;
        Ok(allocator)
    }

    /// Make [start, end) one single free block, forgetting every earlier block.
    ///
    /// This function is unsafe for the same reason as [`FreeListAllocator::new`].
    pub unsafe fn init(&mut self, start: usize, end: usize) -> Result<(), HeapError> {
        let first = align_up(start);
        let end = align_down(end);
        let payload = first.checked_add(HEADER_SIZE).ok_or(HeapError::HeapTooSmall)?;
        if payload >= end {
            return Err(HeapError::HeapTooSmall);
        }

        self.free = LinkedList::new();
        self.allocated = LinkedList::new();
        self.start = first;
        self.end = end;

        let header = BlockHeader::write(first, end - payload);
        self.free.push_back(BlockHeader::node(header));
        Ok(())
    }

    /// Allocate `size` bytes, rounded up to [`ALIGNMENT`], from the first free block that fits.
    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, HeapError> {
        if size == 0 {
            return Err(HeapError::ZeroSize);
        }
        if size > usize::MAX - ALIGNMENT {
            return Err(HeapError::NoSpace);
        }
        let request = align_up(size);

        let node = self
            .free
            .iter()
            .find(|node| unsafe { (*BlockHeader::from_node(*node)).size >= request })
            .ok_or(HeapError::NoSpace)?;
        let header = BlockHeader::from_node(node);

        unsafe {
            let block_end = (*header).end();
            let split = align_up((*header).start + request);
            let remain = match split.checked_add(HEADER_SIZE) {
                Some(payload) if payload <= block_end => block_end - payload,
                _ => 0,
            };

            if remain >= MIN_PAYLOAD {
                // [header | request | tail header | remain]
                let tail = BlockHeader::write(split, remain);
                (*header).size = request;
                self.free.replace(node, BlockHeader::node(tail));
            } else {
                self.free.remove(node);
            }

            self.allocated.push_back(node);
            Ok(NonNull::new_unchecked((*header).start as *mut u8))
        }
    }

    /// Give back a block that [`FreeListAllocator::alloc`] handed out. A null pointer is ignored.
    ///
    /// This function is unsafe because the pointer must come from this allocator and must not be freed twice.
    pub unsafe fn free(&mut self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let header = (ptr as usize - HEADER_SIZE) as *mut BlockHeader;
        debug_assert!(
            (header as usize) >= self.start && (ptr as usize) < self.end,
            "[allocator] Pointer {:#x} is out of the heap.",
            ptr as usize
        );
        let node = BlockHeader::node(header);
        self.allocated.remove(node);

        // keep the free list sorted by address
        let next = self
            .free
            .iter()
            .find(|cur| (*BlockHeader::from_node(*cur)).start > (*header).start);
        match next {
            Some(at) => self.free.insert_before(at, node),
            None => self.free.push_back(node),
        }

        self.coalesce(header);
    }

    /// Merge `header` with the free neighbours that touch it.
    unsafe fn coalesce(&mut self, mut header: *mut BlockHeader) {
        let prev = (*header).node.prev();
        if !prev.is_null() {
            let prev = BlockHeader::from_node(prev);
            if (*prev).end() == header as usize {
                (*prev).size += HEADER_SIZE + (*header).size;
                self.free.remove(BlockHeader::node(header));
                header = prev;
            }
        }

        let next = (*header).node.next();
        if !next.is_null() && (*header).end() == next as usize {
            let next = BlockHeader::from_node(next);
            (*header).size += HEADER_SIZE + (*next).size;
            self.free.remove(BlockHeader::node(next));
        }
    }

    /// Free blocks in address order.
    pub fn free_blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.free.iter().map(Block::from_node)
    }

    /// Allocated blocks in allocation order.
    pub fn allocated_blocks(&self) -> impl Iterator<Item = Block> + '_ {
        self.allocated.iter().map(Block::from_node)
    }

    /// The managed range after alignment, header of the first block included.
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            total: self.end - self.start,
            allocated: self.allocated_blocks().map(|block| block.size).sum(),
            free: self.free_blocks().map(|block| block.size).sum(),
            allocated_blocks: self.allocated.len(),
            free_blocks: self.free.len(),
        }
    }
}

impl Default for FreeListAllocator {
    fn default() -> Self {
        Self::empty()
    }
}
