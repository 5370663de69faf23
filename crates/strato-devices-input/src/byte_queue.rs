//! Bounded FIFO used by the keyboard/mouse devices to buffer bytes for the guest.

/// Fixed-size circular byte buffer.
///
/// `ring` is the size of the backing storage and `depth` is the number of bytes it will accept
/// before dropping new ones. Producers that need to signal "data available" do so based on the
/// return value of [`ByteQueue::push`]; the queue itself has no side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteQueue {
    data: Box<[u8]>,
    depth: usize,
    rptr: usize,
    wptr: usize,
    count: usize,
    last: u8,
}

impl ByteQueue {
    /// Queue that accepts up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_depth(capacity, capacity)
    }

    /// Queue backed by `ring` slots that holds at most `depth` bytes.
    pub fn with_depth(ring: usize, depth: usize) -> Self {
        assert!(ring > 0, "ByteQueue ring must not be empty");
        assert!(depth <= ring, "ByteQueue depth {depth} exceeds ring size {ring}");
        Self {
            data: vec![0; ring].into_boxed_slice(),
            depth,
            rptr: 0,
            wptr: 0,
            count: 0,
            last: 0,
        }
    }

    /// Appends `byte`. Returns `false` if the queue was full and the byte was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.count >= self.depth {
            return false;
        }
        self.data[self.wptr] = byte;
        self.wptr = (self.wptr + 1) % self.data.len();
        self.count += 1;
        true
    }

    /// Removes the oldest byte. An empty queue yields 0.
    pub fn pop(&mut self) -> u8 {
        if self.count == 0 {
            return 0;
        }
        let byte = self.data[self.rptr];
        self.rptr = (self.rptr + 1) % self.data.len();
        self.count -= 1;
        self.last = byte;
        byte
    }

    /// The byte most recently returned by a non-empty [`ByteQueue::pop`].
    pub fn last_read(&self) -> u8 {
        self.last
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
        self.rptr = 0;
        self.wptr = 0;
        self.count = 0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.depth
    }

    /// Maximum number of queued bytes.
    pub fn capacity(&self) -> usize {
        self.depth
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        let ring = self.data.len();
        (0..self.count).map(move |i| self.data[(self.rptr + i) % ring])
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.iter().collect()
    }

    /// Replaces the contents with `bytes`, compacted to the start of the ring.
    ///
    /// Returns `false` (leaving the queue empty) if `bytes` does not fit.
    pub fn restore(&mut self, bytes: &[u8], last: u8) -> bool {
        self.clear();
        self.last = last;
        if bytes.len() > self.depth {
            return false;
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.wptr = bytes.len() % self.data.len();
        self.count = bytes.len();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_when_full() {
        let mut q = ByteQueue::with_depth(4, 3);
        assert!(q.push(1));
        assert!(q.push(2));
        assert!(q.push(3));
        assert!(!q.push(4));
        assert_eq!(q.to_vec(), vec![1, 2, 3]);
        assert!(q.is_full());
    }

    #[test]
    fn pop_on_empty_returns_zero_and_keeps_last() {
        let mut q = ByteQueue::new(2);
        assert_eq!(q.pop(), 0);
        q.push(0x5A);
        assert_eq!(q.pop(), 0x5A);
        assert_eq!(q.pop(), 0);
        assert_eq!(q.last_read(), 0x5A);
    }

    #[test]
    fn wraps_around_the_ring() {
        let mut q = ByteQueue::new(3);
        for round in 0..10u8 {
            q.push(round);
            q.push(round.wrapping_add(100));
            assert_eq!(q.pop(), round);
            assert_eq!(q.pop(), round.wrapping_add(100));
        }
        assert!(q.is_empty());
    }

    #[test]
    fn restore_rejects_oversized_contents() {
        let mut q = ByteQueue::new(2);
        assert!(!q.restore(&[1, 2, 3], 0));
        assert!(q.is_empty());
        assert!(q.restore(&[7, 8], 9));
        assert_eq!(q.to_vec(), vec![7, 8]);
        assert_eq!(q.last_read(), 9);
        assert!(!q.push(1));
    }
}
