// src/Broadcast/transmitter.rs

use crate::error::{BroadcastError, Result};
use crate::Broadcast::Buffer::BroadcastBuffer;
use crate::Broadcast::Structs::Record_Structs::{
    align, is_invalid_msg_type_id, RecordDescriptor, PADDING_MSG_TYPE_ID, RECORD_ALIGNMENT,
    RECORD_HEADER_LENGTH,
};
use crate::Core::region::BroadcastRegion;
use std::sync::Arc;
use tracing::trace;

/// The single writer of a broadcast buffer.
///
/// Publishing never waits: records overwrite the oldest data in the ring
/// whether or not receivers have read it. Receivers that fall a full buffer
/// behind detect this through their lapped count.
pub struct Transmitter {
    buffer: BroadcastBuffer,
    region: Option<Arc<BroadcastRegion>>,
}

impl Transmitter {
    pub(crate) fn new(buffer: BroadcastBuffer, region: Option<Arc<BroadcastRegion>>) -> Self {
        Self { buffer, region }
    }

    /// Attach a transmitter to a caller-provided region of `length` bytes.
    /// Publishing continues from the tail already stored in the trailer.
    ///
    /// # Safety
    /// `region` must point to `length` writable bytes that stay mapped for the
    /// lifetime of the transmitter, and no other transmitter may write to it.
    pub unsafe fn from_raw(region: *mut u8, length: usize) -> Result<Self> {
        let buffer = BroadcastBuffer::from_raw(region, length)?;
        Ok(Self::new(buffer, None))
    }

    /// Publish one message.
    ///
    /// # Errors
    /// * `InvalidMsgTypeId` if `msg_type_id < 1`
    /// * `MessageTooLong` if the payload exceeds [`max_msg_length`](Self::max_msg_length)
    pub fn transmit(&mut self, msg_type_id: i32, payload: &[u8]) -> Result<()> {
        if is_invalid_msg_type_id(msg_type_id) {
            return Err(BroadcastError::InvalidMsgTypeId(msg_type_id));
        }
        let buffer = &self.buffer;
        if payload.len() > buffer.max_msg_length() {
            return Err(BroadcastError::MessageTooLong {
                length: payload.len(),
                max: buffer.max_msg_length(),
            });
        }

        let mut current_tail = buffer.tail_relaxed();
        let mut record_offset = buffer.offset_of(current_tail);
        let aligned_length = align(RECORD_HEADER_LENGTH + payload.len(), RECORD_ALIGNMENT);
        let mut new_tail = current_tail + aligned_length as i64;
        let to_end = buffer.capacity() - record_offset;

        if to_end < aligned_length {
            buffer.signal_tail_intent(new_tail + to_end as i64);
            buffer.put_header(
                record_offset,
                RecordDescriptor {
                    length: (to_end - RECORD_HEADER_LENGTH) as i32,
                    msg_type_id: PADDING_MSG_TYPE_ID,
                },
            );
            trace!(position = current_tail, length = to_end, "inserted padding record");
            current_tail += to_end as i64;
            new_tail += to_end as i64;
            record_offset = 0;
        } else {
            buffer.signal_tail_intent(new_tail);
        }

        buffer.put_header(
            record_offset,
            RecordDescriptor {
                length: payload.len() as i32,
                msg_type_id,
            },
        );
        // Safety: aligned_length fits between record_offset and the ring end.
        unsafe { buffer.put_bytes(record_offset + RECORD_HEADER_LENGTH, payload) };

        buffer.publish(current_tail, new_tail);
        Ok(())
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Largest payload accepted by [`transmit`](Self::transmit).
    pub fn max_msg_length(&self) -> usize {
        self.buffer.max_msg_length()
    }

    pub(crate) fn buffer(&self) -> &BroadcastBuffer {
        &self.buffer
    }
}

impl Drop for Transmitter {
    fn drop(&mut self) {
        if let Some(region) = self.region.take() {
            region.release_transmitter();
        }
    }
}
