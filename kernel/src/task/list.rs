/// Links of one slot in an [`IndexList`].
#[derive(Debug, Clone, Copy)]
struct Link {
    prev: usize,
    next: usize,
}

/// A circular doubly linked list threaded through the slots `0..N` of a pool.
///
/// Each slot owns exactly one link, so a slot sits in at most one place of the list. The head
/// is a sentinel addressed as `N`. An unlinked slot points at itself, which makes removing it
/// again a no-op.
pub struct IndexList<const N: usize> {
    head: Link,
    links: [Link; N],
    len: usize,
}

impl<const N: usize> IndexList<N> {
    pub const fn new() -> Self {
        let mut links = [Link { prev: 0, next: 0 }; N];
        let mut i = 0;
        while i < N {
            links[i] = Link { prev: i, next: i };
            i += 1;
        }
        Self {
            head: Link { prev: N, next: N },
            links,
            len: 0,
        }
    }

    fn link(&self, i: usize) -> &Link {
        if i == N {
            &self.head
        } else {
            &self.links[i]
        }
    }

    fn link_mut(&mut self, i: usize) -> &mut Link {
        if i == N {
            &mut self.head
        } else {
            &mut self.links[i]
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.next == N
    }

    pub fn contains(&self, i: usize) -> bool {
        self.links[i].next != i
    }

    pub fn front(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.head.next)
    }

    /// Link `i` between `prev` and `next`, which must be neighbours.
    fn insert(&mut self, i: usize, prev: usize, next: usize) {
        debug_assert!(!self.contains(i), "slot {} linked twice", i);
        *self.link_mut(i) = Link { prev, next };
        self.link_mut(prev).next = i;
        self.link_mut(next).prev = i;
        self.len += 1;
    }

    pub fn push_back(&mut self, i: usize) {
        self.insert(i, self.head.prev, N);
    }

    pub fn push_front(&mut self, i: usize) {
        self.insert(i, N, self.head.next);
    }

    /// Unlink `i` and make it point at itself. Unlinked slots are left alone.
    pub fn remove(&mut self, i: usize) {
        if !self.contains(i) {
            return;
        }
        let Link { prev, next } = *self.link(i);
        self.link_mut(prev).next = next;
        self.link_mut(next).prev = prev;
        self.links[i] = Link { prev: i, next: i };
        self.len -= 1;
    }

    pub fn pop_front(&mut self) -> Option<usize> {
        let i = self.front()?;
        self.remove(i);
        Some(i)
    }

    pub fn iter(&self) -> Iter<'_, N> {
        Iter {
            list: self,
            curr: self.head.next,
        }
    }
}

impl<const N: usize> Default for IndexList<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Iter<'a, const N: usize> {
    list: &'a IndexList<N>,
    curr: usize,
}

impl<'a, const N: usize> Iterator for Iter<'a, N> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        if self.curr == N {
            return None;
        }
        let i = self.curr;
        self.curr = self.list.link(i).next;
        Some(i)
    }
}
