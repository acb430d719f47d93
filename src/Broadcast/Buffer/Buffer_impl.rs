use std::mem::align_of;
use std::ptr;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{fence, AtomicI32};

use super::layout::{is_capacity_valid, BroadcastDescriptor, TRAILER_LENGTH};
use super::Buffer::BroadcastBuffer;
use crate::error::{BroadcastError, Result};
use crate::Broadcast::Structs::Record_Structs::{
    max_message_length, RecordDescriptor, LENGTH_OFFSET, RECORD_ALIGNMENT, TYPE_OFFSET,
};

impl BroadcastBuffer {
    /// Create a broadcast buffer view over an existing memory region of
    /// `length` bytes. The last [`TRAILER_LENGTH`] bytes hold the trailer,
    /// everything before it is the data region.
    ///
    /// Fails without touching the region when the data capacity is not a
    /// power of two, the region cannot hold a trailer, or the base is not
    /// aligned for the trailer counters.
    ///
    /// # Safety
    /// Caller must ensure `region` points to `length` bytes that stay mapped
    /// for the lifetime of the view and of every copy of it.
    pub unsafe fn from_raw(region: *mut u8, length: usize) -> Result<Self> {
        if length < TRAILER_LENGTH {
            return Err(BroadcastError::RegionTooSmall { length });
        }
        let capacity = length - TRAILER_LENGTH;
        if !is_capacity_valid(capacity) {
            return Err(BroadcastError::InvalidCapacity { capacity });
        }
        let addr = region as usize;
        if region.is_null() || addr % align_of::<BroadcastDescriptor>() != 0 {
            return Err(BroadcastError::Misaligned { addr });
        }

        Ok(Self {
            descriptor: region.add(capacity) as *const BroadcastDescriptor,
            buffer: region,
            capacity,
            mask: capacity - 1,
            max_msg_length: max_message_length(capacity),
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn max_msg_length(&self) -> usize {
        self.max_msg_length
    }

    #[inline]
    fn descriptor(&self) -> &BroadcastDescriptor {
        // Safety: from_raw validated the trailer lies inside the region.
        unsafe { &*self.descriptor }
    }

    /// Position up to which records are fully published.
    #[inline]
    pub fn tail(&self) -> i64 {
        self.descriptor().tail.load(Acquire)
    }

    /// Position the transmitter has reserved up to.
    #[inline]
    pub fn tail_intent(&self) -> i64 {
        self.descriptor().tail_intent.load(Acquire)
    }

    /// Start position of the most recently completed record.
    #[inline]
    pub fn latest(&self) -> i64 {
        self.descriptor().latest.load(Acquire)
    }

    /// Map a stream position to a byte offset in the data region.
    #[inline]
    pub fn offset_of(&self, position: i64) -> usize {
        (position as usize) & self.mask
    }

    /// Whether bytes from `position` onwards are still unclaimed by a
    /// transmitter that has reserved up to `upper`.
    ///
    /// The byte at position `q` is reused once the transmitter writes
    /// `q + capacity`, so a span starting at `position` is intact for as long
    /// as `upper <= position + capacity`, whatever its length.
    #[inline]
    pub fn is_intact(&self, position: i64, upper: i64) -> bool {
        upper - position <= self.capacity as i64
    }

    #[inline]
    fn int_at(&self, offset: usize) -> &AtomicI32 {
        debug_assert!(offset % align_of::<AtomicI32>() == 0 && offset + 4 <= self.capacity);
        // Safety: records start on RECORD_ALIGNMENT boundaries inside the data region.
        unsafe { &*(self.buffer.add(offset) as *const AtomicI32) }
    }

    /// Load the record header at `offset`. The transmitter may be rewriting
    /// it concurrently, so the result is only a candidate.
    #[inline]
    pub(crate) fn read_header(&self, offset: usize) -> RecordDescriptor {
        debug_assert_eq!(offset % RECORD_ALIGNMENT, 0);
        RecordDescriptor {
            length: self.int_at(offset + LENGTH_OFFSET).load(Relaxed),
            msg_type_id: self.int_at(offset + TYPE_OFFSET).load(Relaxed),
        }
    }

    /// Copy `dst.len()` bytes starting at `offset` out of the data region.
    ///
    /// # Safety
    /// `offset + dst.len()` must not exceed the capacity.
    #[inline]
    pub(crate) unsafe fn copy_out(&self, offset: usize, dst: &mut [u8]) {
        debug_assert!(offset + dst.len() <= self.capacity);
        ptr::copy_nonoverlapping(self.buffer.add(offset), dst.as_mut_ptr(), dst.len());
    }

    /// Order every load issued so far before the loads that follow.
    #[inline]
    pub(crate) fn acquire_fence(&self) {
        fence(Acquire);
    }

    // Writer side. Only the single transmitter calls these.

    #[inline]
    pub(crate) fn tail_relaxed(&self) -> i64 {
        self.descriptor().tail.load(Relaxed)
    }

    /// Reserve the stream up to `position`. The fence keeps the record
    /// writes that follow from becoming visible before the reservation.
    #[inline]
    pub(crate) fn signal_tail_intent(&self, position: i64) {
        self.descriptor().tail_intent.store(position, Release);
        fence(Release);
    }

    #[inline]
    pub(crate) fn publish(&self, record_start: i64, new_tail: i64) {
        let descriptor = self.descriptor();
        descriptor.latest.store(record_start, Release);
        descriptor.tail.store(new_tail, Release);
    }

    #[inline]
    pub(crate) fn put_header(&self, offset: usize, header: RecordDescriptor) {
        self.int_at(offset + LENGTH_OFFSET).store(header.length, Relaxed);
        self.int_at(offset + TYPE_OFFSET).store(header.msg_type_id, Relaxed);
    }

    /// # Safety
    /// `offset + src.len()` must not exceed the capacity.
    #[inline]
    pub(crate) unsafe fn put_bytes(&self, offset: usize, src: &[u8]) {
        debug_assert!(offset + src.len() <= self.capacity);
        ptr::copy_nonoverlapping(src.as_ptr(), self.buffer.add(offset), src.len());
    }
}
