// Module naming follows project convention (Broadcast = single writer, many readers)
#[allow(non_snake_case)]
pub mod Broadcast;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
mod Debug {
    pub mod StructDebug;
}

pub mod error;
pub mod ffi;

pub use error::BroadcastError;
