use anyhow::Result;
use std::fmt::Debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub mod stream;
pub mod tunnel;

/// Protocol message parsed from a byte stream. Implementations consume
/// exactly the bytes of one message and nothing beyond it.
pub trait Decode {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Self>
    where
        Self: std::marker::Sized;
}

/// Protocol message serialized to a byte stream.
pub trait Encode {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()>;
}

pub trait MessageRead {
    async fn read_message<Message>(&mut self) -> Result<Message>
    where
        Message: Decode + Debug + 'static;
}

pub trait MessageWrite {
    async fn write_message<Message>(&mut self, message: Message) -> Result<()>
    where
        Message: Encode + Debug + 'static;
}
