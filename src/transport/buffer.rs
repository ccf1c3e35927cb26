//! Single-owner working buffer for one exchange.

/// Fixed-capacity byte buffer with a logical length.
///
/// The exchange loop owns one buffer per direction and lends it out by
/// reference, so only one exchange can ever be using it.
pub struct WorkBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl WorkBuffer {
    /// Allocate a zeroed buffer of `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Reset the logical length of the buffer.
    pub fn reset(&mut self) {
        self.len = 0;
        self.data.fill(0);
    }

    /// Expose the whole buffer as a mutable slice for writes.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..]
    }

    /// Expose the filled portion of the buffer as an immutable slice.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Current logical length of the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check whether the buffer contains no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Set the length of meaningful data within the buffer.
    pub fn set_len(&mut self, len: usize) {
        assert!(len <= self.capacity(), "buffer length exceeds capacity");
        self.len = len;
    }

    /// Return the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for WorkBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkBuffer")
            .field("len", &self.len)
            .field("capacity", &self.capacity())
            .finish()
    }
}
