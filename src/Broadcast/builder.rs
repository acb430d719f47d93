use crate::error::BroadcastError;
use crate::Broadcast::Buffer::layout::{is_capacity_valid, region_length};
use crate::Core::region::BroadcastRegion;
use crate::Core::SharedMemory::{attach_shared_memory, create_heap_memory, create_shared_memory};
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 64 * 1024;
pub const DEFAULT_REGION_NAME: &str = "dmxp_broadcast";

pub struct ChannelBuilder {
    capacity: usize,
    name: String,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY, // 64KB data region
            name: DEFAULT_REGION_NAME.to_string(),
        }
    }
}

impl ChannelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Data capacity in bytes, excluding the trailer. Must be a power of two.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Name of the region under /dev/shm.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    fn checked_region_length(&self) -> std::io::Result<usize> {
        if !is_capacity_valid(self.capacity) {
            return Err(BroadcastError::InvalidCapacity {
                capacity: self.capacity,
            }
            .into());
        }
        Ok(region_length(self.capacity))
    }

    /// Heap-backed region for broadcasting between threads of this process.
    pub fn build_local(self) -> std::io::Result<Arc<BroadcastRegion>> {
        let shm = create_heap_memory(self.checked_region_length()?)?;
        BroadcastRegion::new(shm)
    }

    /// Create (or recreate, zeroed) the named region in /dev/shm.
    pub fn build_shared(self) -> std::io::Result<Arc<BroadcastRegion>> {
        let shm = create_shared_memory(self.checked_region_length()?, &self.name)?;
        BroadcastRegion::new(shm)
    }

    /// Map the named region created by another process. The capacity comes
    /// from the size of the existing region; the configured capacity only sets
    /// the minimum accepted size.
    pub fn attach(self) -> std::io::Result<Arc<BroadcastRegion>> {
        let shm = attach_shared_memory(&self.name, self.checked_region_length()?)?;
        BroadcastRegion::new(shm)
    }
}
