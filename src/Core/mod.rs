pub mod SharedMemory;
pub mod region;

pub use region::BroadcastRegion;
pub use SharedMemory::{
    attach_shared_memory, create_heap_memory, create_shared_memory, unlink_shared_memory,
    HeapMemory, RawHandle, SharedMemoryBackend,
};
