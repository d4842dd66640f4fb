use super::{consts, ReplyStatus};
use crate::{
    common::error::{BurrowError, InvalidValue},
    io::{Decode, Encode},
    net::Address,
};
use anyhow::{ensure, Result};
use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

// The server selects from one of the methods given in METHODS, and
// sends a METHOD selection message:
// +----+--------+
// |VER | METHOD |
// +----+--------+
// | 1  |   1    |
// +----+--------+

#[derive(Debug, PartialEq)]
pub struct HandshakeResponse {
    method: u8,
}

impl HandshakeResponse {
    pub fn builder() -> HandshakeResponseBuilder {
        HandshakeResponseBuilder { method: None }
    }

    pub fn method(&self) -> u8 {
        self.method
    }
}

impl Encode for HandshakeResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let response: [u8; 2] = [consts::SOCKS5_VERSION, self.method];
        stream.write_all(&response).await?;
        Ok(())
    }
}

impl Decode for HandshakeResponse {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Self> {
        let mut response: [u8; 2] = [0, 0];
        stream.read_exact(&mut response).await?;

        let (version, method) = (response[0], response[1]);
        ensure!(
            version == consts::SOCKS5_VERSION,
            BurrowError::DataError(InvalidValue::ProtocolVersion(version))
        );

        Ok(HandshakeResponse { method })
    }
}

pub struct HandshakeResponseBuilder {
    method: Option<u8>,
}

impl HandshakeResponseBuilder {
    pub fn with_auth_method(&mut self, selected_method: u8) -> &mut HandshakeResponseBuilder {
        debug_assert!(self.method.is_none(), "should be unset");
        self.method = Some(selected_method);
        self
    }

    pub fn with_no_acceptable_method(&mut self) -> &mut HandshakeResponseBuilder {
        debug_assert!(self.method.is_none(), "should be unset");
        self.method = Some(consts::auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE);
        self
    }

    pub fn build(&self) -> HandshakeResponse {
        HandshakeResponse {
            method: self.method.expect("Expected selected authentication method"),
        }
    }
}

// The server evaluates the relay request, and returns a reply formed as follows:
// +----+-----+-------+------+----------+----------+
// |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
// +----+-----+-------+------+----------+----------+
// | 1  |  1  | X'00' |  1   | Variable |    2     |
// +----+-----+-------+------+----------+----------+

#[derive(Debug, PartialEq)]
pub struct RelayResponse {
    bound_addr: Address,
    status: ReplyStatus,
}

impl RelayResponse {
    pub fn builder() -> RelayResponseBuilder {
        RelayResponseBuilder {
            bound_addr: None,
            status: None,
        }
    }

    pub fn status(&self) -> ReplyStatus {
        self.status
    }

    pub fn bound_addr(&self) -> &Address {
        &self.bound_addr
    }
}

impl Encode for RelayResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()> {
        let mut bytes = BytesMut::new();
        bytes.put_slice(&[consts::SOCKS5_VERSION, self.status.as_u8(), 0x00]);
        self.bound_addr.write_to(&mut bytes);
        stream.write_all(&bytes).await?;
        Ok(())
    }
}

impl Decode for RelayResponse {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Self> {
        let mut header: [u8; 3] = [0, 0, 0];
        stream.read_exact(&mut header).await?;

        let (version, code) = (header[0], header[1]);
        ensure!(
            version == consts::SOCKS5_VERSION,
            BurrowError::DataError(InvalidValue::ProtocolVersion(version))
        );

        let status = ReplyStatus::from_u8(code);
        let bound_addr = Address::read_from(stream).await?;

        Ok(RelayResponse { bound_addr, status })
    }
}

pub struct RelayResponseBuilder {
    bound_addr: Option<Address>,
    status: Option<ReplyStatus>,
}

impl RelayResponseBuilder {
    pub fn with_success(&mut self) -> &mut RelayResponseBuilder {
        debug_assert!(self.status.is_none(), "should be unset");
        self.status = Some(ReplyStatus::Succeeded);
        self
    }

    pub fn with_err(&mut self, err: anyhow::Error) -> &mut RelayResponseBuilder {
        debug_assert!(self.status.is_none(), "should be unset");
        self.status = Some(ReplyStatus::from(err));
        self
    }

    /// Reply address. The engine echoes the endpoint requested by the
    /// client here, so any `Address` variant may appear.
    pub fn with_bound_address(&mut self, bound_addr: Address) -> &mut RelayResponseBuilder {
        debug_assert!(self.bound_addr.is_none(), "should be unset");
        self.bound_addr = Some(bound_addr);
        self
    }

    pub fn build(&self) -> RelayResponse {
        RelayResponse {
            bound_addr: self.bound_addr.clone().expect("Bound address expected"),
            status: self.status.expect("Reply status expected"),
        }
    }
}
