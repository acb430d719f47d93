use super::*;

/// Getter methods for BroadcastRegion
///
/// These methods expose the private fields of BroadcastRegion for debugging
/// and monitoring purposes.
impl BroadcastRegion {
    /// Get a reference to the underlying memory backend
    pub fn shm(&self) -> &dyn SharedMemoryBackend {
        &*self.shm
    }

    /// Data capacity of the buffer in bytes
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether a transmitter obtained from this region is currently alive
    pub fn is_transmitter_claimed(&self) -> bool {
        *self.transmitter_claimed.lock()
    }
}
