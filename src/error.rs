use std::io;
use thiserror::Error;

use crate::Broadcast::Buffer::layout::{MIN_CAPACITY, TRAILER_LENGTH};

#[derive(Debug, Error)]
pub enum BroadcastError {
    #[error("capacity {capacity} must be a power of two and at least {}", MIN_CAPACITY)]
    InvalidCapacity { capacity: usize },

    #[error("region of {length} bytes cannot hold the {} byte trailer", TRAILER_LENGTH)]
    RegionTooSmall { length: usize },

    #[error("region base {addr:#x} is not aligned for the trailer counters")]
    Misaligned { addr: usize },

    #[error("message type id {0} is reserved or invalid")]
    InvalidMsgTypeId(i32),

    #[error("message of {length} bytes exceeds the maximum of {max}")]
    MessageTooLong { length: usize, max: usize },

    #[error("a transmitter is already attached to this region")]
    TransmitterClaimed,

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, BroadcastError>;

impl From<BroadcastError> for io::Error {
    fn from(err: BroadcastError) -> Self {
        let kind = match &err {
            BroadcastError::Io(e) => e.kind(),
            BroadcastError::InvalidCapacity { .. }
            | BroadcastError::InvalidMsgTypeId(_)
            | BroadcastError::MessageTooLong { .. } => io::ErrorKind::InvalidInput,
            BroadcastError::RegionTooSmall { .. } | BroadcastError::Misaligned { .. } => {
                io::ErrorKind::InvalidData
            }
            BroadcastError::TransmitterClaimed => io::ErrorKind::AlreadyExists,
        };
        io::Error::new(kind, err)
    }
}
