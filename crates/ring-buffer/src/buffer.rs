//! Ring Buffer Implementation

/// Default history length (last 10 samples)
pub const DEFAULT_CAPACITY: usize = 10;

/// Fixed-capacity ring buffer that drops the oldest item on overflow
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[Option<T>]>,
    /// Index of the next write
    head: usize,
    /// Number of live items
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity.
    ///
    /// A zero capacity is bumped to one so `push` always retains the latest item.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = self.storage[self.head].replace(item);
        self.head = (self.head + 1) % self.capacity();

        if self.len < self.capacity() {
            self.len += 1;
            None
        } else {
            evicted
        }
    }

    /// Number of items currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Most recently pushed item
    pub fn latest(&self) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let idx = (self.head + self.capacity() - 1) % self.capacity();
        self.storage[idx].as_ref()
    }

    /// Iterate items from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let start = (self.head + self.capacity() - self.len) % self.capacity();
        (0..self.len).filter_map(move |i| self.storage[(start + i) % self.capacity()].as_ref())
    }

}

impl<T: PartialEq> RingBuffer<T> {
    /// Count how many held items equal `item`
    pub fn count(&self, item: &T) -> usize {
        self.iter().filter(|held| *held == item).count()
    }
}

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
