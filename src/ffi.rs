use crate::error::BroadcastError;
use crate::Broadcast::{Receiver, Transmitter};

// Error codes
pub const DMXP_SUCCESS: i32 = 0;
pub const DMXP_ERROR_NULL_POINTER: i32 = -1;
pub const DMXP_ERROR_INVALID_ARG: i32 = -2;
pub const DMXP_ERROR_INVALID_CAPACITY: i32 = -3;
pub const DMXP_ERROR_REGION_TOO_SMALL: i32 = -4;
pub const DMXP_ERROR_MISALIGNED: i32 = -5;
pub const DMXP_ERROR_MESSAGE_TOO_LONG: i32 = -6;
pub const DMXP_ERROR_INTERNAL: i32 = -7;

/// Handler invoked once per delivered message:
/// `(msg_type_id, buffer, offset, length)`. `buffer` is only valid during the call.
pub type BroadcastHandler = extern "C" fn(i32, *const u8, i32, i32);

/// Handle to a receiver instance (opaque pointer)
pub struct ReceiverHandle {
    inner: Receiver,
}

/// Handle to a transmitter instance (opaque pointer)
pub struct TransmitterHandle {
    inner: Transmitter,
}

fn error_code(err: &BroadcastError) -> i32 {
    match err {
        BroadcastError::InvalidCapacity { .. } => DMXP_ERROR_INVALID_CAPACITY,
        BroadcastError::RegionTooSmall { .. } => DMXP_ERROR_REGION_TOO_SMALL,
        BroadcastError::Misaligned { .. } => DMXP_ERROR_MISALIGNED,
        BroadcastError::InvalidMsgTypeId(_) => DMXP_ERROR_INVALID_ARG,
        BroadcastError::MessageTooLong { .. } => DMXP_ERROR_MESSAGE_TOO_LONG,
        BroadcastError::TransmitterClaimed | BroadcastError::Io(_) => DMXP_ERROR_INTERNAL,
    }
}

// -----------------------------------------------------------------------------
// Receiver API
// -----------------------------------------------------------------------------

/// Attach a receiver to a broadcast region.
///
/// # Arguments
/// * `out` - Receives the new handle on success.
/// * `buffer` - Start of the region (data region followed by the trailer).
/// * `length` - Total region length; `length - 128` must be a power of two.
///
/// # Returns
/// * 0 on success, negative error code otherwise. `*out` is untouched on failure.
///
/// # Safety
/// `buffer` must stay mapped until the handle is freed.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_receiver_init(
    out: *mut *mut ReceiverHandle,
    buffer: *mut u8,
    length: usize,
) -> i32 {
    if out.is_null() || buffer.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    match Receiver::from_raw(buffer, length) {
        Ok(receiver) => {
            *out = Box::into_raw(Box::new(ReceiverHandle { inner: receiver }));
            DMXP_SUCCESS
        }
        Err(e) => {
            tracing::error!("FFI Error: Failed to attach receiver: {}", e);
            error_code(&e)
        }
    }
}

/// Deliver every currently visible message to `handler`.
///
/// # Returns
/// * Number of messages delivered (>= 0), or a negative error code.
///
/// # Safety
/// `handle` must come from `dmxp_broadcast_receiver_init` and not be shared
/// between threads.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_receiver_receive(
    handle: *mut ReceiverHandle,
    handler: Option<BroadcastHandler>,
) -> i32 {
    if handle.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }
    let handler = match handler {
        Some(handler) => handler,
        None => return DMXP_ERROR_NULL_POINTER,
    };

    let receiver = &mut (*handle).inner;
    let received = receiver.receive(|msg_type_id, buffer, offset, length| {
        handler(msg_type_id, buffer.as_ptr(), offset as i32, length as i32)
    });
    i32::try_from(received).unwrap_or(i32::MAX)
}

/// Number of times the receiver was lapped, or -1 for a null handle.
///
/// # Safety
/// `handle` must be null or come from `dmxp_broadcast_receiver_init`.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_receiver_lapped_count(handle: *const ReceiverHandle) -> i64 {
    if handle.is_null() {
        return -1;
    }
    (*handle).inner.lapped_count() as i64
}

/// Free a receiver handle.
///
/// # Safety
/// `handle` must be null or come from `dmxp_broadcast_receiver_init`.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_receiver_free(handle: *mut ReceiverHandle) {
    if !handle.is_null() {
        let _ = Box::from_raw(handle); // Dropped automatically
    }
}

// -----------------------------------------------------------------------------
// Transmitter API
// -----------------------------------------------------------------------------

/// Attach the transmitter to a broadcast region.
///
/// # Safety
/// `buffer` must stay mapped until the handle is freed and no other
/// transmitter may write to the same region.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_transmitter_init(
    out: *mut *mut TransmitterHandle,
    buffer: *mut u8,
    length: usize,
) -> i32 {
    if out.is_null() || buffer.is_null() {
        return DMXP_ERROR_NULL_POINTER;
    }

    match Transmitter::from_raw(buffer, length) {
        Ok(transmitter) => {
            *out = Box::into_raw(Box::new(TransmitterHandle { inner: transmitter }));
            DMXP_SUCCESS
        }
        Err(e) => {
            tracing::error!("FFI Error: Failed to attach transmitter: {}", e);
            error_code(&e)
        }
    }
}

/// Publish a message.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
///
/// # Safety
/// `handle` must come from `dmxp_broadcast_transmitter_init`; `data` must
/// point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_transmitter_transmit(
    handle: *mut TransmitterHandle,
    msg_type_id: i32,
    data: *const u8,
    len: usize,
) -> i32 {
    if handle.is_null() || (data.is_null() && len > 0) {
        return DMXP_ERROR_NULL_POINTER;
    }

    let payload: &[u8] = if len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    };
    match (*handle).inner.transmit(msg_type_id, payload) {
        Ok(()) => DMXP_SUCCESS,
        Err(e) => error_code(&e),
    }
}

/// Free a transmitter handle.
///
/// # Safety
/// `handle` must be null or come from `dmxp_broadcast_transmitter_init`.
#[no_mangle]
pub unsafe extern "C" fn dmxp_broadcast_transmitter_free(handle: *mut TransmitterHandle) {
    if !handle.is_null() {
        let _ = Box::from_raw(handle);
    }
}
