use super::{Decode, Encode, MessageRead, MessageWrite};
use anyhow::Result;
use log::trace;
use std::{
    fmt::Debug,
    ops::{Deref, DerefMut},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};

/// Alias for stream wrapper over `TcpStream`
pub type BurrowTcpStream = BurrowStream<TcpStream>;

/// Stream wrapper implementation

#[derive(Debug)]
pub struct BurrowStream<T> {
    stream: T,
}

impl<T> BurrowStream<T>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    pub fn new(stream: T) -> BurrowStream<T> {
        BurrowStream { stream }
    }
}

impl<T> MessageRead for BurrowStream<T>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    async fn read_message<Message>(&mut self) -> Result<Message>
    where
        Message: Decode + Debug,
    {
        let message = Message::read_from(&mut self.stream).await?;
        trace!("Read {:?}", message);

        Ok(message)
    }
}

impl<T> MessageWrite for BurrowStream<T>
where
    T: AsyncReadExt + AsyncWriteExt + Unpin,
{
    async fn write_message<Message>(&mut self, message: Message) -> Result<()>
    where
        Message: Encode + Debug,
    {
        Message::write_to(&message, &mut self.stream).await?;
        trace!("Write {:?}", message);

        Ok(())
    }
}

impl<T> Deref for BurrowStream<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.stream
    }
}

impl<T> DerefMut for BurrowStream<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.stream
    }
}
