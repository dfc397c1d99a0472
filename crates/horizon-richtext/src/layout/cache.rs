//! Fixed-capacity cache keyed by paragraph index.

use std::collections::HashMap;

/// Entry plus its links in the recency list.
#[derive(Debug)]
struct Node<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// A least-recently-used cache of per-paragraph values.
///
/// `get` and `put` are O(1). The recency list is threaded through the map
/// entries by key, with the most recently used entry at the head. Memory is
/// bounded by the capacity, never by the document size.
#[derive(Debug)]
pub struct FastCache<T> {
    capacity: usize,
    entries: HashMap<usize, Node<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    hits: u64,
    misses: u64,
}

impl<T> FastCache<T> {
    /// Create a cache holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            hits: 0,
            misses: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn contains(&self, key: usize) -> bool {
        self.entries.contains_key(&key)
    }

    /// Look up an entry and mark it most recently used.
    pub fn get(&mut self, key: usize) -> Option<&T> {
        if self.entries.contains_key(&key) {
            self.hits += 1;
            self.unlink(key);
            self.push_front(key);
            self.entries.get(&key).map(|n| &n.value)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Look up an entry without touching the recency order.
    pub fn peek(&self, key: usize) -> Option<&T> {
        self.entries.get(&key).map(|n| &n.value)
    }

    /// Insert or replace an entry, evicting the least recently used one when
    /// full. Returns the evicted value, if any.
    pub fn put(&mut self, key: usize, value: T) -> Option<T> {
        if let Some(node) = self.entries.get_mut(&key) {
            node.value = value;
            self.unlink(key);
            self.push_front(key);
            return None;
        }

        let evicted = match self.tail {
            Some(tail) if self.entries.len() >= self.capacity => self.remove(tail),
            _ => None,
        };

        self.entries.insert(
            key,
            Node {
                value,
                prev: None,
                next: None,
            },
        );
        self.push_front(key);
        evicted
    }

    pub fn remove(&mut self, key: usize) -> Option<T> {
        if !self.entries.contains_key(&key) {
            return None;
        }
        self.unlink(key);
        self.entries.remove(&key).map(|n| n.value)
    }

    /// Remove every entry for which `f` returns `true`.
    pub fn remove_where(&mut self, mut f: impl FnMut(usize) -> bool) {
        let keys: Vec<usize> = self.entries.keys().copied().filter(|k| f(*k)).collect();
        for key in keys {
            self.remove(key);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.head = None;
        self.tail = None;
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<usize> {
        let mut keys = Vec::with_capacity(self.entries.len());
        let mut cursor = self.head;
        while let Some(key) = cursor {
            keys.push(key);
            cursor = self.entries.get(&key).and_then(|n| n.next);
        }
        keys
    }

    fn unlink(&mut self, key: usize) {
        let Some(node) = self.entries.get(&key) else {
            return;
        };
        let (prev, next) = (node.prev, node.next);

        match prev {
            Some(p) => {
                if let Some(n) = self.entries.get_mut(&p) {
                    n.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.entries.get_mut(&n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = self.entries.get_mut(&key) {
            node.prev = None;
            node.next = None;
        }
    }

    fn push_front(&mut self, key: usize) {
        let old_head = self.head;
        if let Some(node) = self.entries.get_mut(&key) {
            node.prev = None;
            node.next = old_head;
        }
        if let Some(h) = old_head {
            if let Some(node) = self.entries.get_mut(&h) {
                node.prev = Some(key);
            }
        }
        self.head = Some(key);
        if self.tail.is_none() {
            self.tail = Some(key);
        }
    }
}
