use super::auth::AuthMethodSelector;
use crate::{
    common::{error::BurrowError, logging},
    io::{tunnel::BurrowTunnel, MessageRead, MessageWrite},
    net::{
        tcp::{connection::BurrowTcpConnection, establish_tcp_connection_with_opts, TcpConnectionOptions},
        Address,
    },
    proto::socks5::{
        consts::auth::SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
        request::{HandshakeRequest, RelayRequest},
        response::{HandshakeResponse, RelayResponse},
        Command,
    },
};
use anyhow::{anyhow, bail, Result};
use human_bytes::human_bytes;
use log::{debug, error, info};
use socket2::TcpKeepalive;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpStream, time};

/// Upper bound on the whole negotiation: greeting exchange, relay request
/// and target dial. Established tunnels are not subject to it.
const HANDSHAKE_DEADLINE: Duration = Duration::from_secs(30);

/// Per-connection SOCKS5 state machine for the proxy-server role:
/// greeting -> relay request -> tunnel. Any failure closes the accepted
/// connection; nothing is retried.
pub struct BurrowSocks5Handler<A> {
    conn: BurrowTcpConnection,
    selector: Arc<A>,
}

impl<A> BurrowSocks5Handler<A>
where
    A: AuthMethodSelector,
{
    pub fn new(conn: BurrowTcpConnection, selector: Arc<A>) -> BurrowSocks5Handler<A> {
        BurrowSocks5Handler { conn, selector }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.conn.peer_addr()
    }

    pub async fn handle(&mut self) -> Result<()> {
        // The deadline covers both message exchanges and the target dial,
        // so a stalled peer cannot pin the task forever.
        let established = time::timeout(HANDSHAKE_DEADLINE, async {
            self.process_handshake().await?;
            self.process_relay_request().await
        })
        .await
        .map_err(|_| anyhow!("SOCKS5 negotiation did not finish within {:?}", HANDSHAKE_DEADLINE))??;

        // Proceed to data relaying if CONNECT has been served successfully.
        match established {
            Some((endpoint, target_stream)) => self.run_tunnel(endpoint, target_stream).await,
            None => Ok(()),
        }
    }

    /// Handshaking with SOCKS5 client: read the greeting, let the selection
    /// strategy pick a method among advertised ones and communicate the
    /// choice back. Rejection by the strategy closes the connection right
    /// after the response is written.
    async fn process_handshake(&mut self) -> Result<()> {
        let request = self.conn.stream_mut().read_message::<HandshakeRequest>().await?;

        let mut response_builder = HandshakeResponse::builder();

        match self.selector.select(request.auth_methods()) {
            SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE => {
                debug!("No acceptable methods identified for {}", self.conn.peer_addr());
                response_builder.with_no_acceptable_method();
                self.conn.stream_mut().write_message(response_builder.build()).await?;
                bail!(BurrowError::NoAcceptableAuthMethod)
            }
            method => {
                debug!("Selected authentication method {:#02x} for {}", method, self.conn.peer_addr());
                response_builder.with_auth_method(method);
                self.conn.stream_mut().write_message(response_builder.build()).await
            }
        }
    }

    /// Handling SOCKS5 command which comes in relay request from client.
    ///
    /// Returns the requested endpoint together with the dialed target
    /// stream when CONNECT succeeds. A malformed request closes the
    /// connection without any reply; a rejected command or a failed dial
    /// is answered with an error reply, then the connection is closed.
    async fn process_relay_request(&mut self) -> Result<Option<(Address, TcpStream)>> {
        let request = self.conn.stream_mut().read_message::<RelayRequest>().await?;
        let endpoint = request.target_addr().clone();

        if request.command() != Command::Connect {
            let err = BurrowError::UnsupportedSocksCommand(request.command());
            return self.reject_relay_request(&request, anyhow!(err)).await;
        }

        debug!("Handling SOCKS5 CONNECT from {}", self.conn.peer_addr());

        // Create TCP options.
        let mut tcp_opts = TcpConnectionOptions::new();
        tcp_opts.set_keepalive(
            TcpKeepalive::new()
                .with_time(Duration::from_secs(300))    // 5 min
                .with_interval(Duration::from_secs(60)) // 1 min
                .with_retries(5),
        );

        // Establish TCP connection with the target endpoint.
        let target_stream = match establish_tcp_connection_with_opts(&endpoint, &tcp_opts).await {
            Ok(stream) => stream,
            Err(err) => return self.reject_relay_request(&request, err).await,
        };

        // Respond to relay request with success. The reply carries the
        // requested endpoint back as the bound address.
        let response = RelayResponse::builder()
            .with_success()
            .with_bound_address(endpoint.clone())
            .build();
        self.conn.stream_mut().write_message(response).await?;

        Ok(Some((endpoint, target_stream)))
    }

    async fn reject_relay_request(&mut self, request: &RelayRequest, err: anyhow::Error) -> Result<Option<(Address, TcpStream)>> {
        let error_string = err.to_string();
        let response = RelayResponse::builder()
            .with_err(err)
            .with_bound_address(request.target_addr().clone())
            .build();

        logging::log_request_handling_error!(self.conn, error_string, request, response);
        self.conn.stream_mut().write_message(response).await?;

        Ok(None)
    }

    async fn run_tunnel(&mut self, endpoint: Address, mut r2l: TcpStream) -> Result<()> {
        let (conn_peer_addr, conn_bound_addr) = (self.conn.peer_addr(), self.conn.local_addr());

        // Acquire mutable reference to inner object of stream wrapper.
        let mut l2r = &mut **self.conn.stream_mut();

        // Create proxy tunnel which operates with the following TCP streams:
        // - L2R: client   <--> proxy
        // - R2L: endpoint <--> proxy
        let mut tunnel = BurrowTunnel::new(&mut l2r, &mut r2l);

        logging::log_tunnel_created!(conn_peer_addr, conn_bound_addr, endpoint);

        // Start data relaying
        match tunnel.run().await {
            Ok((l2r, r2l)) => {
                logging::log_tunnel_closed!(conn_peer_addr, conn_bound_addr, endpoint, l2r, r2l);
            }
            Err(err) => {
                logging::log_tunnel_closed_with_error!(conn_peer_addr, conn_bound_addr, endpoint, err);
            }
        }

        Ok(())
    }
}
