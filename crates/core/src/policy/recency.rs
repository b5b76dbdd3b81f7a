//! Recency-ordered key list.
//!
//! A doubly linked list whose nodes live in a slab (`Vec`) and are addressed
//! by slot index. The head is the Most Recently Used position and the tail
//! the Least Recently Used one. Freed slots are recycled, so a list that stays
//! at capacity stops allocating after warm-up.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `push_front()`, `move_to_front()`, `remove()`, `pop_back()`: O(1)
//!   - `iter()`: O(n)
//! - **Space Complexity:** O(n) with n the peak number of resident keys

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

/// MRU-to-LRU ordered list of keys.
#[derive(Debug, Default)]
pub struct RecencyList {
    nodes: Vec<Node>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl RecencyList {
    /// Creates an empty list with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of keys in the list.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the list holds no keys.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Key stored in `slot`.
    #[inline]
    pub fn key(&self, slot: usize) -> &str {
        &self.nodes[slot].key
    }

    /// Inserts `key` at the MRU position and returns its slot.
    pub fn push_front(&mut self, key: String) -> usize {
        let node = Node {
            key,
            prev: None,
            next: self.head,
        };
        let slot = if let Some(slot) = self.free.pop() {
            self.nodes[slot] = node;
            slot
        } else {
            self.nodes.push(node);
            self.nodes.len() - 1
        };
        match self.head {
            Some(old) => self.nodes[old].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
        slot
    }

    /// Moves the key in `slot` to the MRU position.
    pub fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        let node = &mut self.nodes[slot];
        node.prev = None;
        node.next = self.head;
        match self.head {
            Some(old) => self.nodes[old].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
    }

    /// Removes the key in `slot` and returns it.
    pub fn remove(&mut self, slot: usize) -> String {
        self.unlink(slot);
        self.free.push(slot);
        std::mem::take(&mut self.nodes[slot].key)
    }

    /// Removes and returns the LRU key.
    pub fn pop_back(&mut self) -> Option<String> {
        self.tail.map(|slot| self.remove(slot))
    }

    /// Keys from MRU to LRU.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = &self.nodes[slot];
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.len -= 1;
    }
}

/// Iterator over a [`RecencyList`] from MRU to LRU.
#[derive(Debug)]
pub struct Iter<'a> {
    list: &'a RecencyList,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = &self.list.nodes[slot];
        self.cursor = node.next;
        Some(&node.key)
    }
}
