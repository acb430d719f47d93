use crate::error::BroadcastError;
use crate::Broadcast::Buffer::BroadcastBuffer;
use crate::Broadcast::{Receiver, Transmitter};
use crate::Core::SharedMemory::SharedMemoryBackend;
use std::io;
use std::sync::Arc;
mod debug;
mod getters;

// Use parking_lot's Mutex for better performance
use parking_lot::Mutex;

/// Owns the memory behind one broadcast buffer.
///
/// A region hands out at most one [`Transmitter`] at a time and any number of
/// [`Receiver`]s. Both keep the region alive through an `Arc`, so the mapping
/// outlives every endpoint attached to it.
pub struct BroadcastRegion {
    shm: Box<dyn SharedMemoryBackend>,
    buffer: BroadcastBuffer,
    transmitter_claimed: Mutex<bool>, // Single-writer guard within this process
}

impl BroadcastRegion {
    /// Wrap a memory backend whose whole size is the data region followed by
    /// the trailer.
    pub fn new(shm: Box<dyn SharedMemoryBackend>) -> io::Result<Arc<Self>> {
        // Safety: the backend keeps the mapping alive for as long as the region.
        let buffer = unsafe { BroadcastBuffer::from_raw(shm.as_ptr(), shm.size()) }?;
        tracing::debug!(
            capacity = buffer.capacity(),
            handle = ?shm.raw_handle(),
            "broadcast region ready"
        );
        Ok(Arc::new(Self {
            shm,
            buffer,
            transmitter_claimed: Mutex::new(false),
        }))
    }

    /// Attach a new receiver positioned at the current tail.
    pub fn receiver(self: &Arc<Self>) -> Receiver {
        Receiver::attach(self.buffer, Some(Arc::clone(self)))
    }

    /// Claim the transmitter for this region. Fails with `AlreadyExists` while
    /// another transmitter obtained here is still alive.
    pub fn transmitter(self: &Arc<Self>) -> io::Result<Transmitter> {
        let mut claimed = self.transmitter_claimed.lock();
        if *claimed {
            return Err(BroadcastError::TransmitterClaimed.into());
        }
        *claimed = true;
        Ok(Transmitter::new(self.buffer, Some(Arc::clone(self))))
    }

    pub(crate) fn release_transmitter(&self) {
        *self.transmitter_claimed.lock() = false;
    }

    /// The buffer view over this region.
    pub fn buffer(&self) -> &BroadcastBuffer {
        &self.buffer
    }
}

// Implement Send + Sync since the buffer is only mutated through atomics and
// by the single claimed transmitter
unsafe impl Send for BroadcastRegion {}
unsafe impl Sync for BroadcastRegion {}
