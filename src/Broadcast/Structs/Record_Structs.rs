// Framing of a single record inside the broadcast data region.

// no atomics in RecordDescriptor; it documents the ABI only, header fields
// are loaded individually from shared memory by the buffer view

use std::mem::size_of;

/// Header that precedes each record payload in the data region.
/// ABI-stable across languages: `length` then `msg_type_id`, no padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordDescriptor {
    /// Payload length in bytes, header excluded.
    pub length: i32,
    /// Application tag. Values below 1 are invalid, -1 marks padding.
    pub msg_type_id: i32,
}

pub const RECORD_HEADER_LENGTH: usize = size_of::<RecordDescriptor>();

/// Every record starts on a multiple of this many bytes.
pub const RECORD_ALIGNMENT: usize = RECORD_HEADER_LENGTH;

pub const LENGTH_OFFSET: usize = 0;
pub const TYPE_OFFSET: usize = 4;

/// Reserved type id of a filler record that pads the ring up to its end.
pub const PADDING_MSG_TYPE_ID: i32 = -1;

impl RecordDescriptor {
    #[inline]
    pub fn is_padding(&self) -> bool {
        self.msg_type_id == PADDING_MSG_TYPE_ID
    }

    /// Header plus payload, rounded up to [`RECORD_ALIGNMENT`].
    /// Returns `None` for a negative length.
    #[inline]
    pub fn aligned_length(&self) -> Option<usize> {
        usize::try_from(self.length)
            .ok()
            .map(|len| align(RECORD_HEADER_LENGTH + len, RECORD_ALIGNMENT))
    }
}

#[inline]
pub const fn is_invalid_msg_type_id(msg_type_id: i32) -> bool {
    msg_type_id < 1
}

/// Largest payload a single record may carry in a buffer of `capacity` bytes.
#[inline]
pub const fn max_message_length(capacity: usize) -> usize {
    capacity / 8
}

/// Scratch space a receiver needs to hold one complete record.
#[inline]
pub const fn scratch_buffer_length(capacity: usize) -> usize {
    max_message_length(capacity) + RECORD_HEADER_LENGTH
}

/// Round `value` up to `alignment`, which must be a power of two.
#[inline]
pub const fn align(value: usize, alignment: usize) -> usize {
    (value + (alignment - 1)) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_length_rounds_to_header_size() {
        let rec = |length| RecordDescriptor { length, msg_type_id: 1 };
        assert_eq!(rec(0).aligned_length(), Some(8));
        assert_eq!(rec(1).aligned_length(), Some(16));
        assert_eq!(rec(8).aligned_length(), Some(16));
        assert_eq!(rec(9).aligned_length(), Some(24));
        assert_eq!(rec(-4).aligned_length(), None);
    }

    #[test]
    fn type_id_classification() {
        assert!(is_invalid_msg_type_id(0));
        assert!(is_invalid_msg_type_id(PADDING_MSG_TYPE_ID));
        assert!(is_invalid_msg_type_id(i32::MIN));
        assert!(!is_invalid_msg_type_id(1));
        assert!(RecordDescriptor { length: 0, msg_type_id: -1 }.is_padding());
        assert!(!RecordDescriptor { length: 0, msg_type_id: -2 }.is_padding());
    }
}
