// C ABI tests: drive the extern "C" functions the way a C client would.

use dmxp_broadcast::Broadcast::Buffer::layout::region_length;
use dmxp_broadcast::Core::{HeapMemory, SharedMemoryBackend};
use dmxp_broadcast::ffi::*;
use std::cell::RefCell;
use std::ptr;

thread_local! {
    static SEEN: RefCell<Vec<(i32, Vec<u8>)>> = RefCell::new(Vec::new());
}

extern "C" fn record(msg_type_id: i32, buffer: *const u8, offset: i32, length: i32) {
    let payload =
        unsafe { std::slice::from_raw_parts(buffer.add(offset as usize), length as usize) }.to_vec();
    SEEN.with(|seen| seen.borrow_mut().push((msg_type_id, payload)));
}

fn take_seen() -> Vec<(i32, Vec<u8>)> {
    SEEN.with(|seen| std::mem::take(&mut *seen.borrow_mut()))
}

#[test]
fn receiver_init_rejects_bad_regions() {
    let shm = HeapMemory::new(region_length(1024)).unwrap();
    let mut handle: *mut ReceiverHandle = ptr::null_mut();

    unsafe {
        assert_eq!(
            dmxp_broadcast_receiver_init(&mut handle, shm.as_ptr(), region_length(1000)),
            DMXP_ERROR_INVALID_CAPACITY
        );
        assert_eq!(
            dmxp_broadcast_receiver_init(&mut handle, shm.as_ptr(), 64),
            DMXP_ERROR_REGION_TOO_SMALL
        );
        assert_eq!(
            dmxp_broadcast_receiver_init(&mut handle, ptr::null_mut(), region_length(1024)),
            DMXP_ERROR_NULL_POINTER
        );
    }
    assert!(handle.is_null(), "no handle is created on failure");
}

#[test]
fn transmit_and_receive_through_c_abi() {
    let shm = HeapMemory::new(region_length(1024)).unwrap();
    let mut tx: *mut TransmitterHandle = ptr::null_mut();
    let mut rx: *mut ReceiverHandle = ptr::null_mut();

    unsafe {
        assert_eq!(dmxp_broadcast_transmitter_init(&mut tx, shm.as_ptr(), shm.size()), DMXP_SUCCESS);
        assert_eq!(dmxp_broadcast_receiver_init(&mut rx, shm.as_ptr(), shm.size()), DMXP_SUCCESS);

        assert_eq!(dmxp_broadcast_receiver_receive(rx, Some(record)), 0);

        let a = b"A";
        let bb = b"BB";
        assert_eq!(dmxp_broadcast_transmitter_transmit(tx, 5, a.as_ptr(), a.len()), DMXP_SUCCESS);
        assert_eq!(dmxp_broadcast_transmitter_transmit(tx, 7, bb.as_ptr(), bb.len()), DMXP_SUCCESS);
        assert_eq!(
            dmxp_broadcast_transmitter_transmit(tx, 0, a.as_ptr(), a.len()),
            DMXP_ERROR_INVALID_ARG
        );
        let big = [0u8; 200];
        assert_eq!(
            dmxp_broadcast_transmitter_transmit(tx, 1, big.as_ptr(), big.len()),
            DMXP_ERROR_MESSAGE_TOO_LONG
        );

        assert_eq!(dmxp_broadcast_receiver_receive(rx, Some(record)), 2);
        assert_eq!(take_seen(), vec![(5, b"A".to_vec()), (7, b"BB".to_vec())]);
        assert_eq!(dmxp_broadcast_receiver_lapped_count(rx), 0);
        assert_eq!(dmxp_broadcast_receiver_receive(rx, None), DMXP_ERROR_NULL_POINTER);

        dmxp_broadcast_receiver_free(rx);
        dmxp_broadcast_transmitter_free(tx);
    }

    assert_eq!(
        unsafe { dmxp_broadcast_receiver_receive(ptr::null_mut(), Some(record)) },
        DMXP_ERROR_NULL_POINTER
    );
    assert_eq!(unsafe { dmxp_broadcast_receiver_lapped_count(ptr::null()) }, -1);
}
