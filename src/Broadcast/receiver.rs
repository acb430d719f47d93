// src/Broadcast/receiver.rs

use crate::error::Result;
use crate::Broadcast::Buffer::BroadcastBuffer;
use crate::Broadcast::Structs::Record_Structs::{
    is_invalid_msg_type_id, scratch_buffer_length, RecordDescriptor, LENGTH_OFFSET,
    RECORD_HEADER_LENGTH, TYPE_OFFSET,
};
use crate::Core::region::BroadcastRegion;
use crossbeam_utils::Backoff;
use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Outcome of one "advance one" step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// `next_record` reached the published tail.
    CaughtUp,
    /// Skipped a padding record at the end of the ring.
    Padding,
    /// Overtaken by the transmitter; moved to a newer frame boundary.
    Lapped,
    /// A record was withheld as corrupt or torn.
    Dropped,
    /// A validated record sits in the scratch buffer.
    Message { msg_type_id: i32, length: usize },
}

/// A record whose header passed the plausibility checks, not yet copied.
#[derive(Debug, Clone, Copy)]
struct Frame {
    position: i64,
    offset: usize,
    header: RecordDescriptor,
    aligned_length: usize,
}

/// A reader attached to a broadcast buffer.
///
/// Every receiver owns its own position and scratch memory, so any number of
/// them can consume the same buffer without coordinating with each other or
/// with the transmitter. A receiver is `Send` but not `Sync`: move it to the
/// thread that drives it.
pub struct Receiver {
    scratch: Box<[u8]>,
    buffer: BroadcastBuffer,
    cursor: i64,
    next_record: i64,
    record_offset: usize,
    lapped_count: u64,
    dropped_count: u64,
    _region: Option<Arc<BroadcastRegion>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl Receiver {
    pub(crate) fn attach(buffer: BroadcastBuffer, region: Option<Arc<BroadcastRegion>>) -> Self {
        let tail = buffer.tail();
        debug!(capacity = buffer.capacity(), tail, "broadcast receiver attached");
        Self {
            scratch: vec![0u8; scratch_buffer_length(buffer.capacity())].into_boxed_slice(),
            buffer,
            cursor: tail,
            next_record: tail,
            record_offset: buffer.offset_of(tail),
            lapped_count: 0,
            dropped_count: 0,
            _region: region,
            _not_sync: PhantomData,
        }
    }

    /// Attach a receiver to a caller-provided region of `length` bytes
    /// (data region followed by the trailer). Reading starts at the current
    /// tail, so only records published after this call are delivered.
    ///
    /// # Safety
    /// `region` must point to `length` readable bytes that stay mapped for the
    /// lifetime of the receiver.
    pub unsafe fn from_raw(region: *mut u8, length: usize) -> Result<Self> {
        let buffer = BroadcastBuffer::from_raw(region, length)?;
        Ok(Self::attach(buffer, None))
    }

    /// Deliver every record currently visible to `handler` and return how many
    /// were delivered.
    ///
    /// The handler receives `(msg_type_id, buffer, offset, length)` where the
    /// payload is `buffer[offset..offset + length]`. `buffer` aliases scratch
    /// memory reused by the next record, so it cannot outlive the call.
    /// Padding, corrupt and torn records are never handed to the handler.
    pub fn receive<F>(&mut self, mut handler: F) -> usize
    where
        F: FnMut(i32, &[u8], usize, usize),
    {
        let mut messages_received = 0;
        loop {
            match self.advance_one() {
                Advance::CaughtUp => break,
                Advance::Padding | Advance::Lapped | Advance::Dropped => continue,
                Advance::Message {
                    msg_type_id,
                    length,
                } => {
                    let frame = &self.scratch[..RECORD_HEADER_LENGTH + length];
                    handler(msg_type_id, frame, RECORD_HEADER_LENGTH, length);
                    messages_received += 1;
                }
            }
        }
        messages_received
    }

    /// Like [`receive`](Self::receive), but keeps polling with backoff until
    /// at least one message was delivered or `timeout` elapsed.
    pub fn receive_timeout<F>(&mut self, mut handler: F, timeout: Duration) -> usize
    where
        F: FnMut(i32, &[u8], usize, usize),
    {
        let start = Instant::now();
        let backoff = Backoff::new();
        loop {
            let received = self.receive(&mut handler);
            if received > 0 || start.elapsed() >= timeout {
                return received;
            }
            backoff.snooze();
        }
    }

    pub(crate) fn advance_one(&mut self) -> Advance {
        let frame = match self.next_frame() {
            Ok(frame) => frame,
            Err(advance) => return advance,
        };
        let copied = self.copy_frame(&frame);
        self.accept_frame(frame, copied)
    }

    /// Locate the record at `next_record` and check its header. Every outcome
    /// other than a deliverable record is settled here and returned as `Err`.
    fn next_frame(&mut self) -> std::result::Result<Frame, Advance> {
        let buffer = self.buffer;
        let cursor = self.next_record;
        if cursor >= buffer.tail() {
            return Err(Advance::CaughtUp);
        }

        if !buffer.is_intact(cursor, buffer.tail_intent()) {
            let resume = self.resync_point(cursor);
            self.lapped_count += 1;
            warn!(
                lapped_count = self.lapped_count,
                next_record = cursor,
                resume,
                "broadcast receiver lapped, resynchronising"
            );
            self.move_to(resume);
            return Err(Advance::Lapped);
        }

        let offset = buffer.offset_of(cursor);
        self.record_offset = offset;
        let header = buffer.read_header(offset);
        let to_end = buffer.capacity() - offset;
        let aligned_length = match header.aligned_length() {
            Some(aligned) if aligned <= to_end => aligned,
            _ => return Err(self.skip_unframed(cursor, header)),
        };

        if header.is_padding() {
            if aligned_length != to_end {
                return Err(self.skip_unframed(cursor, header));
            }
            trace!(position = cursor, length = aligned_length, "skipping padding record");
            self.cursor = cursor + aligned_length as i64;
            self.next_record = self.cursor;
            return Err(Advance::Padding);
        }

        // Checked above: length is non-negative.
        if header.length as usize > buffer.max_msg_length() {
            return Err(self.skip_unframed(cursor, header));
        }
        if is_invalid_msg_type_id(header.msg_type_id) {
            self.dropped_count += 1;
            warn!(
                position = cursor,
                msg_type_id = header.msg_type_id,
                "dropping broadcast record with invalid type id"
            );
            self.cursor = cursor;
            self.next_record = cursor + aligned_length as i64;
            return Err(Advance::Dropped);
        }

        Ok(Frame {
            position: cursor,
            offset,
            header,
            aligned_length,
        })
    }

    /// Copy header and payload of `frame` into scratch and return the header
    /// as copied.
    fn copy_frame(&mut self, frame: &Frame) -> RecordDescriptor {
        let length = frame.header.length as usize;
        let dst = &mut self.scratch[..RECORD_HEADER_LENGTH + length];
        // Safety: next_frame checked the frame fits before the end of the ring.
        unsafe { self.buffer.copy_out(frame.offset, dst) };
        RecordDescriptor {
            length: read_i32(dst, LENGTH_OFFSET),
            msg_type_id: read_i32(dst, TYPE_OFFSET),
        }
    }

    /// Whether the record at `position` was still intact once the copy
    /// finished: no reservation has reached a full ring past it.
    fn validate(&self, position: i64) -> bool {
        self.buffer.acquire_fence();
        self.buffer.is_intact(position, self.buffer.tail_intent())
    }

    fn accept_frame(&mut self, frame: Frame, copied: RecordDescriptor) -> Advance {
        let position = frame.position;
        if !self.validate(position) {
            let resume = self.resync_point(position);
            self.dropped_count += 1;
            warn!(
                position,
                resume,
                "broadcast record overwritten while copying, dropping it"
            );
            self.move_to(resume);
            return Advance::Dropped;
        }

        self.cursor = position;
        self.next_record = position + frame.aligned_length as i64;
        if copied != frame.header {
            self.dropped_count += 1;
            warn!(position, "broadcast record header changed while copying, dropping it");
            return Advance::Dropped;
        }
        Advance::Message {
            msg_type_id: frame.header.msg_type_id,
            length: frame.header.length as usize,
        }
    }

    /// The header at `cursor` cannot be used to find the next record.
    fn skip_unframed(&mut self, cursor: i64, header: RecordDescriptor) -> Advance {
        let resume = self.resync_point(cursor);
        self.dropped_count += 1;
        warn!(
            position = cursor,
            length = header.length,
            msg_type_id = header.msg_type_id,
            resume,
            "broadcast record header is implausible, skipping ahead"
        );
        self.move_to(resume);
        Advance::Dropped
    }

    /// Frame boundary strictly after `position` to continue from once the
    /// record there can no longer be trusted. `position` must be below the
    /// published tail.
    ///
    /// `latest` is used when it is ahead, already published and not yet
    /// overwritten itself; a stale `latest` falls back to the tail.
    fn resync_point(&self, position: i64) -> i64 {
        let buffer = &self.buffer;
        let latest = buffer.latest();
        let tail = buffer.tail();
        if latest > position && latest < tail && buffer.is_intact(latest, buffer.tail_intent()) {
            latest
        } else {
            tail
        }
    }

    fn move_to(&mut self, position: i64) {
        self.cursor = position;
        self.next_record = position;
        self.record_offset = self.buffer.offset_of(position);
    }

    /// Start position of the last record this receiver consumed or skipped.
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Position of the next record this receiver will attempt.
    pub fn next_record(&self) -> i64 {
        self.next_record
    }

    /// Offset in the data region of the record most recently examined.
    pub fn record_offset(&self) -> usize {
        self.record_offset
    }

    /// Number of times the transmitter overtook this receiver and it had to
    /// resynchronise. Each increment means messages were lost.
    pub fn lapped_count(&self) -> u64 {
        self.lapped_count
    }

    /// Number of records withheld from the handler as corrupt or torn.
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn max_msg_length(&self) -> usize {
        self.buffer.max_msg_length()
    }

    pub(crate) fn buffer(&self) -> &BroadcastBuffer {
        &self.buffer
    }
}

#[inline]
fn read_i32(frame: &[u8], offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&frame[offset..offset + 4]);
    i32::from_ne_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Broadcast::ChannelBuilder;
    use crate::Broadcast::Structs::Record_Structs::PADDING_MSG_TYPE_ID;

    const CAPACITY: usize = 1024;

    fn collect(rx: &mut Receiver) -> (usize, Vec<(i32, Vec<u8>)>) {
        let mut seen = Vec::new();
        let n = rx.receive(|msg_type_id, buffer, offset, length| {
            seen.push((msg_type_id, buffer[offset..offset + length].to_vec()));
        });
        (n, seen)
    }

    /// Write a raw record the way a transmitter would, without validation.
    fn write_raw(buffer: &BroadcastBuffer, header: RecordDescriptor, payload: &[u8], aligned: usize) {
        let tail = buffer.tail_relaxed();
        let offset = buffer.offset_of(tail);
        buffer.signal_tail_intent(tail + aligned as i64);
        buffer.put_header(offset, header);
        unsafe { buffer.put_bytes(offset + RECORD_HEADER_LENGTH, payload) };
        buffer.publish(tail, tail + aligned as i64);
    }

    #[test]
    fn invalid_type_id_is_skipped_and_counted() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();
        let mut tx = region.transmitter().unwrap();

        write_raw(
            region.buffer(),
            RecordDescriptor { length: 3, msg_type_id: 0 },
            b"bad",
            16,
        );
        tx.transmit(9, b"good").unwrap();

        let (n, seen) = collect(&mut rx);
        assert_eq!(n, 1);
        assert_eq!(seen, vec![(9, b"good".to_vec())]);
        assert_eq!(rx.dropped_count(), 1);
        assert_eq!(rx.lapped_count(), 0);
    }

    #[test]
    fn implausible_length_resumes_at_frame_boundary() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();

        write_raw(
            region.buffer(),
            RecordDescriptor { length: (CAPACITY * 4) as i32, msg_type_id: 3 },
            &[],
            16,
        );

        let (n, _) = collect(&mut rx);
        assert_eq!(n, 0);
        assert_eq!(rx.dropped_count(), 1);
        assert_eq!(rx.next_record(), region.buffer().tail());

        let mut tx = region.transmitter().unwrap();
        tx.transmit(4, b"after").unwrap();
        let (n, seen) = collect(&mut rx);
        assert_eq!(n, 1);
        assert_eq!(seen[0], (4, b"after".to_vec()));
    }

    #[test]
    fn short_padding_is_treated_as_corrupt() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();

        write_raw(
            region.buffer(),
            RecordDescriptor { length: 0, msg_type_id: PADDING_MSG_TYPE_ID },
            &[],
            8,
        );

        assert_eq!(rx.receive(|_, _, _, _| panic!("padding delivered")), 0);
        assert_eq!(rx.dropped_count(), 1);
    }

    #[test]
    fn record_overwritten_during_copy_is_dropped() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();
        let mut tx = region.transmitter().unwrap();
        tx.transmit(1, b"overwritten").unwrap();

        let frame = rx.next_frame().unwrap();
        let copied = rx.copy_frame(&frame);
        // The transmitter reserves a full ring past the record mid-copy
        region
            .buffer()
            .signal_tail_intent(frame.position + CAPACITY as i64 + 8);

        assert!(!rx.validate(frame.position));
        assert_eq!(rx.accept_frame(frame, copied), Advance::Dropped);
        assert_eq!(rx.dropped_count(), 1);
        assert!(rx.next_record() > frame.position);
        assert_eq!(rx.next_record(), region.buffer().tail());

        tx.transmit(2, b"fresh").unwrap();
        let (n, seen) = collect(&mut rx);
        assert_eq!(n, 1);
        assert_eq!(seen, vec![(2, b"fresh".to_vec())]);
    }

    #[test]
    fn header_changed_during_copy_is_dropped() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();
        let mut tx = region.transmitter().unwrap();
        tx.transmit(3, b"first").unwrap();
        tx.transmit(4, b"second").unwrap();

        let frame = rx.next_frame().unwrap();
        region
            .buffer()
            .put_header(frame.offset, RecordDescriptor { length: 5, msg_type_id: 9 });
        let copied = rx.copy_frame(&frame);

        assert!(rx.validate(frame.position));
        assert_eq!(rx.accept_frame(frame, copied), Advance::Dropped);
        assert_eq!(rx.next_record(), 16);

        let (n, seen) = collect(&mut rx);
        assert_eq!(n, 1);
        assert_eq!(seen, vec![(4, b"second".to_vec())]);
        assert_eq!(rx.dropped_count(), 1);
    }

    #[test]
    fn resync_point_skips_latest_not_yet_covered_by_tail() {
        let region = ChannelBuilder::new().with_capacity(CAPACITY).build_local().unwrap();
        let mut rx = region.receiver();

        write_raw(
            region.buffer(),
            RecordDescriptor { length: (CAPACITY * 4) as i32, msg_type_id: 3 },
            &[],
            16,
        );
        // latest is stored before tail, so a reader can see it run ahead
        let trailer = unsafe { &*region.buffer().descriptor };
        trailer.latest.store(24, std::sync::atomic::Ordering::Release);

        assert_eq!(rx.resync_point(0), 16);
        assert_eq!(rx.advance_one(), Advance::Dropped);
        assert_eq!(rx.next_record(), 16);
        assert_eq!(rx.advance_one(), Advance::CaughtUp);
    }

    #[test]
    fn receiver_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Receiver>();
    }
}
