use core::{marker::PhantomData, ptr::null_mut};

/// Links embedded at the very beginning of whatever structure is put on a [`LinkedList`].
///
/// Since the node is the first field of a `#[repr(C)]` owner, a node pointer is also the owner
/// pointer and no offset arithmetic is needed to get back to it.
#[repr(C)]
#[derive(Debug)]
pub struct ListNode {
    prev: *mut ListNode,
    next: *mut ListNode,
}

impl ListNode {
    pub const fn new() -> Self {
        Self {
            prev: null_mut(),
            next: null_mut(),
        }
    }

    pub fn prev(&self) -> *mut ListNode {
        self.prev
    }

    pub fn next(&self) -> *mut ListNode {
        self.next
    }
}

impl Default for ListNode {
    fn default() -> Self {
        Self::new()
    }
}

/// An intrusive doubly linked list.
///
/// The list only keeps the two ends, so it can be moved freely; the nodes live wherever their
/// owners live (for the heap, inside the heap region itself).
#[derive(Debug)]
pub struct LinkedList {
    head: *mut ListNode,
    tail: *mut ListNode,
    len: usize,
}

unsafe impl Send for LinkedList {}

impl LinkedList {
    pub const fn new() -> Self {
        Self {
            head: null_mut(),
            tail: null_mut(),
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn front(&self) -> Option<*mut ListNode> {
        (!self.head.is_null()).then_some(self.head)
    }

    pub fn back(&self) -> Option<*mut ListNode> {
        (!self.tail.is_null()).then_some(self.tail)
    }

    /// Append a node at the tail.
    ///
    /// This function is unsafe because user has to guarantee that `node` is a legal pointer that is not on any list.
    pub unsafe fn push_back(&mut self, node: *mut ListNode) {
        (*node).prev = self.tail;
        (*node).next = null_mut();
        if self.tail.is_null() {
            self.head = node;
        } else {
            (*self.tail).next = node;
        }
        self.tail = node;
        self.len += 1;
    }

    /// Link `node` right before `at`, which must already be on this list.
    pub unsafe fn insert_before(&mut self, at: *mut ListNode, node: *mut ListNode) {
        let prev = (*at).prev;
        (*node).prev = prev;
        (*node).next = at;
        (*at).prev = node;
        if prev.is_null() {
            self.head = node;
        } else {
            (*prev).next = node;
        }
        self.len += 1;
    }

    /// Unlink `node` from this list, leaving it isolated.
    pub unsafe fn remove(&mut self, node: *mut ListNode) {
        let prev = (*node).prev;
        let next = (*node).next;
        if prev.is_null() {
            self.head = next;
        } else {
            (*prev).next = next;
        }
        if next.is_null() {
            self.tail = prev;
        } else {
            (*next).prev = prev;
        }
        (*node).prev = null_mut();
        (*node).next = null_mut();
        self.len -= 1;
    }

    /// Put `new` at the position of `old`, which leaves the list.
    pub unsafe fn replace(&mut self, old: *mut ListNode, new: *mut ListNode) {
        self.insert_before(old, new);
        self.remove(old);
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            curr: self.head,
            _list: PhantomData,
        }
    }
}

impl Default for LinkedList {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a> {
    curr: *mut ListNode,
    _list: PhantomData<&'a LinkedList>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = *mut ListNode;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.curr.is_null() {
            let result = self.curr;
            self.curr = unsafe { (*self.curr).next };
            Some(result)
        } else {
            None
        }
    }
}
