use std::mem::size_of;
use std::sync::atomic::AtomicI64;

/// Cache line length the trailer is sized against.
pub const CACHE_LINE_LENGTH: usize = 64;

/// Smallest data capacity accepted for a broadcast buffer.
///
/// Below this the maximum message length (`capacity / 8`) could not hold
/// even a single record alignment unit.
pub const MIN_CAPACITY: usize = 64;

/// The trailer located directly after the data region of a broadcast buffer.
///
/// All three counters are byte positions in the unbounded stream written by
/// the transmitter. They only ever increase. Receivers only load them, always
/// with `Acquire`; the transmitter stores them with `Release`.
///
/// The struct is exactly two cache lines wide. The counters themselves are
/// packed at the front and the rest of the two lines is padding, so nothing
/// placed after the trailer shares a line with them.
#[repr(C, align(8))]
pub struct BroadcastDescriptor {
    /// Position the transmitter is about to advance `tail` to. Stored before
    /// any record bytes are written.
    pub tail_intent: AtomicI64,

    /// Position up to which records are completely written.
    pub tail: AtomicI64,

    /// Start position of the most recently completed record. Lapped
    /// receivers jump here.
    pub latest: AtomicI64,

    pub _pad: [u8; (2 * CACHE_LINE_LENGTH) - (3 * size_of::<i64>())],
}

/// Size in bytes of the trailer that follows the data region.
pub const TRAILER_LENGTH: usize = size_of::<BroadcastDescriptor>();

/// A data capacity is valid when it is a power of two and at least
/// [`MIN_CAPACITY`].
#[inline]
pub const fn is_capacity_valid(capacity: usize) -> bool {
    capacity >= MIN_CAPACITY && capacity.is_power_of_two()
}

/// Total region length needed for a data region of `capacity` bytes.
#[inline]
pub const fn region_length(capacity: usize) -> usize {
    capacity + TRAILER_LENGTH
}
