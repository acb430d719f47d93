// Shared memory backend tests for Linux
// Run with: cargo test --test shared_memory -- --nocapture

#[cfg(target_os = "linux")]
mod linux_tests {
    use dmxp_broadcast::Broadcast::Buffer::layout::region_length;
    use dmxp_broadcast::Broadcast::ChannelBuilder;
    use dmxp_broadcast::Core::{
        attach_shared_memory, create_shared_memory, unlink_shared_memory, RawHandle,
    };
    use serial_test::serial;
    use std::io;

    fn cleanup(name: &str) {
        let _ = unlink_shared_memory(name);
    }

    #[test]
    #[serial]
    fn test_create_shared_memory_is_zeroed() {
        let name = "dmxp_bcast_test_create";
        let size = region_length(4096);
        let shm = create_shared_memory(size, name).unwrap();

        assert_eq!(shm.size(), size);
        assert!(!shm.as_ptr().is_null());
        assert_eq!(shm.as_ptr() as usize % 128, 0);

        let slice = unsafe { std::slice::from_raw_parts(shm.as_ptr(), size) };
        assert!(slice.iter().all(|&b| b == 0));

        match shm.raw_handle() {
            RawHandle::Fd(fd) => assert!(fd > 0, "File descriptor should be positive"),
            RawHandle::Heap => panic!("expected a file descriptor"),
        }
        cleanup(name);
    }

    #[test]
    #[serial]
    fn test_attach_sees_same_memory() {
        let name = "dmxp_bcast_test_attach";
        let size = region_length(1024);
        let creator = create_shared_memory(size, name).unwrap();
        let attached = attach_shared_memory(name, size).unwrap();
        assert_eq!(attached.size(), size);

        unsafe {
            *creator.as_ptr().add(10) = 0x42;
            assert_eq!(*attached.as_ptr().add(10), 0x42);
        }
        cleanup(name);
    }

    #[test]
    #[serial]
    fn test_attach_missing_region_fails() {
        let name = "dmxp_bcast_test_missing";
        cleanup(name);
        let err = attach_shared_memory(name, 1024).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    #[serial]
    fn test_attach_too_small_region_fails() {
        let name = "dmxp_bcast_test_small";
        let _creator = create_shared_memory(region_length(1024), name).unwrap();
        let err = attach_shared_memory(name, region_length(4096)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        cleanup(name);
    }

    #[test]
    #[serial]
    fn test_broadcast_across_mappings() {
        let name = "dmxp_bcast_test_channel";
        let writer_side = ChannelBuilder::new()
            .with_capacity(1024)
            .with_name(name)
            .build_shared()
            .unwrap();
        let reader_side = ChannelBuilder::new()
            .with_capacity(1024)
            .with_name(name)
            .attach()
            .unwrap();
        assert_eq!(reader_side.capacity(), 1024);

        let mut tx = writer_side.transmitter().unwrap();
        let mut first = reader_side.receiver();
        let mut second = reader_side.receiver();

        tx.transmit(11, b"status:ok").unwrap();
        tx.transmit(12, b"counter:7").unwrap();

        for rx in [&mut first, &mut second] {
            let mut seen = Vec::new();
            let n = rx.receive(|msg_type_id, buffer, offset, length| {
                seen.push((msg_type_id, buffer[offset..offset + length].to_vec()));
            });
            assert_eq!(n, 2);
            assert_eq!(
                seen,
                vec![(11, b"status:ok".to_vec()), (12, b"counter:7".to_vec())]
            );
        }
        cleanup(name);
    }
}
