use crate::Broadcast::Buffer::BroadcastBuffer;
use crate::Broadcast::{Receiver, Transmitter};
use crate::Core::region::BroadcastRegion;
use std::fmt;

/// Debug function for BroadcastRegion
///
/// Shows the backend handle, the capacity and whether the transmitter is
/// claimed. The mapped memory itself stays opaque.
pub fn debug_broadcast_region(region: &BroadcastRegion, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BroadcastRegion")
        .field("shm", &"<opaque>")
        .field("handle", &region.shm().raw_handle())
        .field("capacity", &region.capacity())
        .field("transmitter_claimed", &region.is_transmitter_claimed())
        .finish()
}

/// Debug function for BroadcastBuffer
///
/// Displays the region address and a snapshot of the trailer counters
pub fn debug_broadcast_buffer(buffer: &BroadcastBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("BroadcastBuffer")
        .field("buffer", &format_args!("0x{:x}", buffer.buffer as usize))
        .field("capacity", &buffer.capacity())
        .field("tail_intent", &buffer.tail_intent())
        .field("tail", &buffer.tail())
        .field("latest", &buffer.latest())
        .finish()
}

/// Debug function for Receiver
///
/// Shows the per-reader position and diagnostics, not the scratch contents
pub fn debug_receiver(receiver: &Receiver, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Receiver")
        .field("buffer", &format_args!("0x{:x}", receiver.buffer().buffer as usize))
        .field("cursor", &receiver.cursor())
        .field("next_record", &receiver.next_record())
        .field("record_offset", &receiver.record_offset())
        .field("lapped_count", &receiver.lapped_count())
        .field("dropped_count", &receiver.dropped_count())
        .finish_non_exhaustive()
}

pub fn debug_transmitter(transmitter: &Transmitter, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Transmitter")
        .field("buffer", &format_args!("0x{:x}", transmitter.buffer().buffer as usize))
        .field("tail", &transmitter.buffer().tail())
        .finish_non_exhaustive()
}
