use super::{consts, Command};
use crate::{
    common::error::{BurrowError, InvalidValue},
    io::{Decode, Encode},
    net::Address,
};
use anyhow::{ensure, Result};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

// The client connects to the server, and sends a
// version identifier/method selection message:
// +----+----------+----------+
// |VER | NMETHODS | METHODS  |
// +----+----------+----------+
// | 1  |    1     | 1 to 255 |
// +----+----------+----------+

#[derive(Debug, PartialEq)]
pub struct HandshakeRequest {
    /// Advertised method identifiers, in wire order. Unknown identifiers
    /// are kept as-is: choosing among them is the selection strategy's
    /// business, not the codec's.
    auth_methods: Vec<u8>,
}

impl HandshakeRequest {
    pub fn new(auth_methods: Vec<u8>) -> HandshakeRequest {
        debug_assert!(auth_methods.len() <= u8::MAX as usize);
        HandshakeRequest { auth_methods }
    }

    pub fn auth_methods(&self) -> &[u8] {
        &self.auth_methods
    }
}

impl Decode for HandshakeRequest {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Self>
    where
        Self: std::marker::Sized,
    {
        let mut header: [u8; 2] = [0, 0];
        stream.read_exact(&mut header).await?;

        let (version, nmethods) = (header[0], header[1]);

        // Bail out if version is not supported.
        ensure!(
            version == consts::SOCKS5_VERSION,
            BurrowError::DataError(InvalidValue::ProtocolVersion(version))
        );

        let mut auth_methods = vec![0u8; nmethods.into()];
        if nmethods > 0 {
            stream.read_exact(&mut auth_methods).await?;
        }

        Ok(HandshakeRequest { auth_methods })
    }
}

impl Encode for HandshakeRequest {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&[consts::SOCKS5_VERSION, self.auth_methods.len() as u8]);
        bytes.put_slice(&self.auth_methods);
        stream.write_all(&bytes).await?;
        Ok(())
    }
}

// The SOCKS request information is sent by the client as
// soon as it has established a connection to the SOCKS
// server, and completed the authentication negotiations.
// +----+-----+-------+------+----------+----------+
// |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

#[derive(Debug, PartialEq)]
pub struct RelayRequest {
    command: Command,
    target_addr: Address,
}

impl RelayRequest {
    pub fn new(command: Command, target_addr: Address) -> RelayRequest {
        RelayRequest { command, target_addr }
    }

    pub fn command(&self) -> Command {
        self.command
    }

    pub fn target_addr(&self) -> &Address {
        &self.target_addr
    }
}

impl Decode for RelayRequest {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<RelayRequest> {
        let mut buff: [u8; 3] = [0, 0, 0];
        stream.read_exact(&mut buff).await?;

        // RSV octet (buff[2]) is read and discarded.
        let (version, cmd) = (buff[0], buff[1]);

        ensure!(
            version == consts::SOCKS5_VERSION,
            BurrowError::DataError(InvalidValue::ProtocolVersion(version))
        );

        let command = Command::try_from(cmd)?;
        let target_addr = Address::read_from(stream).await?;

        Ok(RelayRequest { command, target_addr })
    }
}

impl Encode for RelayRequest {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&[consts::SOCKS5_VERSION, self.command.as_u8(), 0x00]);
        self.target_addr.write_to(&mut bytes);
        stream.write_all(&bytes).await?;
        Ok(())
    }
}
