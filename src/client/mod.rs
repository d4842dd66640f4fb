use crate::{
    common::error::BurrowError,
    io::{
        stream::{BurrowStream, BurrowTcpStream},
        MessageRead, MessageWrite,
    },
    net::Address,
    proto::socks5::{
        consts::auth::SOCKS5_AUTH_METHOD_NONE,
        request::{HandshakeRequest, RelayRequest},
        response::{HandshakeResponse, RelayResponse},
        Command, ReplyStatus,
    },
};
use anyhow::{anyhow, bail, Result};
use log::debug;
use std::{net::SocketAddr, time::Duration};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time,
};

const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(30);

/// Application-side consumer of an established tunnel.
///
/// Invoked exactly once, only after the whole handshake has succeeded,
/// and takes exclusive ownership of the tunneled connection: the protocol
/// engine is done at that point.
pub trait Connected {
    async fn on_connected(&mut self, tunnel: BurrowTcpStream) -> Result<()>;
}

/// SOCKS5 proxy client: negotiates a CONNECT tunnel through a proxy
/// and hands the live connection over to a `Connected` callback.
pub struct BurrowClient {
    proxy_addr: SocketAddr,
}

impl BurrowClient {
    pub fn new(proxy_addr: SocketAddr) -> BurrowClient {
        BurrowClient { proxy_addr }
    }

    /// Dials the proxy, tunnels to `target` (textual `host:port`) and
    /// passes the established tunnel to `handler`.
    pub async fn connect<C: Connected>(&self, target: &str, handler: &mut C) -> Result<()> {
        let target_addr = Address::from_target_str(target)?;

        debug!("Connecting to proxy {} for target {}", self.proxy_addr, target_addr);
        let stream = BurrowStream::new(TcpStream::connect(self.proxy_addr).await?);

        let tunnel = time::timeout(HANDSHAKE_DEADLINE, Self::establish_tunnel(stream, &target_addr))
            .await
            .map_err(|_| anyhow!("SOCKS5 negotiation did not finish within {:?}", HANDSHAKE_DEADLINE))??;

        debug!("Tunnel to {} established through {}", target_addr, self.proxy_addr);
        handler.on_connected(tunnel).await
    }

    /// Drives the client side of the handshake over an already-established
    /// proxy connection: greeting advertising "no authentication" only,
    /// then the CONNECT request. Anything but a `Succeeded` reply aborts.
    async fn establish_tunnel<T>(mut stream: BurrowStream<T>, target_addr: &Address) -> Result<BurrowStream<T>>
    where
        T: AsyncReadExt + AsyncWriteExt + Unpin,
    {
        stream
            .write_message(HandshakeRequest::new(vec![SOCKS5_AUTH_METHOD_NONE]))
            .await?;
        let handshake_reply = stream.read_message::<HandshakeResponse>().await?;
        debug!("Proxy selected authentication method {:#02x}", handshake_reply.method());

        stream
            .write_message(RelayRequest::new(Command::Connect, target_addr.clone()))
            .await?;
        let relay_reply = stream.read_message::<RelayResponse>().await?;

        match relay_reply.status() {
            ReplyStatus::Succeeded => Ok(stream),
            status => bail!(BurrowError::HandshakeFailed(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::InvalidValue;

    macro_rules! assert_burrow_err {
        ($expected:expr, $actual:expr) => {
            assert_eq!(
                $expected,
                $actual.downcast::<BurrowError>().expect("Burrow error type expected")
            )
        };
    }

    #[tokio::test]
    async fn establish_tunnel_to_domain_target() {
        let target = Address::from_target_str("example.com:80").unwrap();

        #[rustfmt::skip]
        let stream = tokio_test::io::Builder::new()
            .write(&[0x05, 0x01, 0x00])
            .read(&[0x05, 0x00])
            .write(&[
                0x05, 0x01, 0x00, 0x03,
                11, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'c', b'o', b'm',
                0x00, 0x50,
            ])
            .read(&[
                0x05, 0x00, 0x00, 0x03,
                11, b'e', b'x', b'a', b'm', b'p', b'l', b'e', b'.', b'c', b'o', b'm',
                0x00, 0x50,
            ])
            .build();

        BurrowClient::establish_tunnel(BurrowStream::new(stream), &target)
            .await
            .expect("Tunnel should be established on Succeeded reply");
    }

    #[tokio::test]
    async fn abort_on_corrupted_reply_version() {
        let target = Address::from_target_str("localhost:1080").unwrap();

        // Method selection reply carries version 0x04.
        let stream = tokio_test::io::Builder::new()
            .write(&[0x05, 0x01, 0x00])
            .read(&[0x04, 0x00])
            .build();

        let err = BurrowClient::establish_tunnel(BurrowStream::new(stream), &target)
            .await
            .expect_err("Version mismatch should abort the handshake");

        assert_burrow_err!(BurrowError::DataError(InvalidValue::ProtocolVersion(0x04)), err);
    }

    #[tokio::test]
    async fn abort_on_unsuccessful_reply_status() {
        let target = Address::from_target_str("10.0.0.1:9000").unwrap();

        #[rustfmt::skip]
        let stream = tokio_test::io::Builder::new()
            .write(&[0x05, 0x01, 0x00])
            .read(&[0x05, 0x00])
            .write(&[0x05, 0x01, 0x00, 0x01, 10, 0, 0, 1, 0x23, 0x28])
            .read(&[0x05, 0x04, 0x00, 0x01, 10, 0, 0, 1, 0x23, 0x28])
            .build();

        let err = BurrowClient::establish_tunnel(BurrowStream::new(stream), &target)
            .await
            .expect_err("Non-success reply should abort the handshake");

        assert_burrow_err!(BurrowError::HandshakeFailed(ReplyStatus::HostUnreachable), err);
    }
}
