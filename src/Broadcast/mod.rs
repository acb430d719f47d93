pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::BroadcastBuffer; // re-export for stable path
}

pub mod Structs {
    pub mod Record_Structs;
    pub use Record_Structs::RecordDescriptor; // re-export for stable path
}

mod builder;
mod receiver;
mod transmitter;

pub use builder::ChannelBuilder;
pub use receiver::Receiver;
pub use transmitter::Transmitter;
