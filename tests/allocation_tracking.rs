// Allocation tracking for the receive path
//
// Note: dhat only allows one profiler per process, so the test here is
// marked #[serial_test::serial] and this file holds the global allocator.
//
// cargo test --test allocation_tracking -- --nocapture

use dmxp_broadcast::Broadcast::ChannelBuilder;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

#[test]
#[serial_test::serial]
fn receive_and_transmit_do_not_allocate() {
    let _profiler = dhat::Profiler::builder().testing().build();

    let region = ChannelBuilder::new().with_capacity(64 * 1024).build_local().unwrap();
    let mut rx = region.receiver();
    let mut tx = region.transmitter().unwrap();
    let payload = [0xABu8; 96];

    let before = dhat::HeapStats::get();

    let mut delivered = 0usize;
    let mut checksum = 0u64;
    for round in 0..1000 {
        for _ in 0..4 {
            tx.transmit(1 + (round % 7), &payload).unwrap();
        }
        delivered += rx.receive(|msg_type_id, buffer, offset, length| {
            checksum += msg_type_id as u64 + buffer[offset..offset + length].len() as u64;
        });
    }

    let after = dhat::HeapStats::get();
    println!("heap stats before: {:?}, after: {:?}", before, after);

    assert_eq!(delivered, 4000);
    assert!(checksum > 0);
    dhat::assert_eq!(after.total_blocks, before.total_blocks);
    dhat::assert_eq!(after.total_bytes, before.total_bytes);
}
