// This is the shared broadcast buffer view - data region followed by the trailer

use super::layout::BroadcastDescriptor;

/// A view over a broadcast buffer living in (possibly shared) memory.
///
/// This struct is NOT stored in shared memory. It is a transient view that
/// holds pointers into the region:
///
/// ```text
/// +----------------------------- capacity -----------------------------+---------+
/// | record | record | ... | padding |                                 | trailer |
/// +--------------------------------------------------------------------+---------+
/// ```
///
/// ### Concurrency Design:
/// - **Transmitter**: the single writer reserves space by storing
///   `tail_intent`, writes the record bytes, then publishes by storing
///   `latest` and `tail`. All stores are `Release`.
/// - **Receivers**: any number of readers load the counters with `Acquire`
///   and copy records out. They never write to the region and never wait on
///   the transmitter.
#[derive(Clone, Copy)]
pub struct BroadcastBuffer {
    /// Pointer to the trailer, located `capacity` bytes after `buffer`.
    pub(crate) descriptor: *const BroadcastDescriptor,

    /// Pointer to the start of the data region.
    pub(crate) buffer: *mut u8,

    /// Length of the data region in bytes. Always a power of two.
    pub(crate) capacity: usize,

    /// Calculated as `capacity - 1`; maps stream positions to offsets.
    pub(crate) mask: usize,

    /// Largest payload one record may carry.
    pub(crate) max_msg_length: usize,
}

unsafe impl Send for BroadcastBuffer {}
unsafe impl Sync for BroadcastBuffer {}
