use super::Address;
use anyhow::Result;
use log::{debug, trace};
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

/// Different TCP connection options.
///
/// **Fields**:
/// * ```keep_alive``` - setting for TCP keepalive procedure
///
///
pub struct TcpConnectionOptions {
    keep_alive: Option<TcpKeepalive>,
}

impl TcpConnectionOptions {
    pub fn new() -> TcpConnectionOptions {
        TcpConnectionOptions { keep_alive: None }
    }

    pub fn set_keepalive(&mut self, keep_alive: TcpKeepalive) -> &mut TcpConnectionOptions {
        debug_assert!(self.keep_alive.is_none(), "should be unset");
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn apply_to(&self, tcp_stream: &mut TcpStream) -> Result<()> {
        let tcp_sock_ref = SockRef::from(&tcp_stream);

        if let Some(keep_alive) = &self.keep_alive {
            tcp_sock_ref.set_tcp_keepalive(keep_alive)?;
        }

        Ok(())
    }
}

impl Default for TcpConnectionOptions {
    fn default() -> Self {
        TcpConnectionOptions::new()
    }
}

/// Establish TCP connection with passed ```endpoint```.
///
/// Input ```tcp_opts``` are applied to created TCP socket right after stream creation.
pub async fn establish_tcp_connection_with_opts(endpoint: &Address, tcp_opts: &TcpConnectionOptions) -> Result<TcpStream> {
    // Resolve endpoint address.
    trace!("Endpoint address {} resolution: ... ", endpoint);
    let resolved = endpoint.to_socket_addr().await?;
    trace!("Endpoint address {} resolution: SUCCESS with {}", endpoint, resolved);

    // Establish TCP connection with the endpoint.
    debug!("TCP connection establishment with the endpoint {}: ... ", endpoint);
    let mut tcp_stream = TcpStream::connect(resolved).await.map_err(anyhow::Error::from)?;
    debug!("TCP connection establishment with the endpoint {}: SUCCESS", endpoint);

    // Apply passed options to created TCP stream.
    tcp_opts.apply_to(&mut tcp_stream)?;

    Ok(tcp_stream)
}

pub mod listener {

    use super::connection::{BurrowTcpConnection, BurrowTcpConnectionFactory};
    use anyhow::Result;
    use async_listen::{backpressure, backpressure::Backpressure, ListenExt};
    use tokio::net::{TcpListener, ToSocketAddrs};
    use tokio_stream::{wrappers::TcpListenerStream, StreamExt};

    /// Custom implementation of TCP listener.
    pub struct BurrowTcpListener {
        incoming: Backpressure<TcpListenerStream>,
        factory: BurrowTcpConnectionFactory,
    }

    impl BurrowTcpListener {
        /// Binds TCP listener to passed `addr`.
        ///
        /// Argument `conn_limit` sets the limit of open TCP connections. Thus accepting of new connections
        /// on returned `BurrowTcpListener` will be paused, when number of open TCP connections will reach
        /// the `conn_limit`.
        pub async fn bind(addr: impl ToSocketAddrs, conn_limit: usize) -> Result<BurrowTcpListener> {
            // Bind TCP listener.
            let listener = TcpListener::bind(addr).await?;

            // Create backpressure limit and supply the receiver to the created stream.
            let (bp_tx, bp_rx) = backpressure::new(conn_limit);
            let incoming = TcpListenerStream::new(listener).apply_backpressure(bp_rx);

            Ok(BurrowTcpListener {
                incoming,
                factory: BurrowTcpConnectionFactory::new(bp_tx),
            })
        }

        pub async fn accept(&mut self) -> Result<BurrowTcpConnection> {
            let err_msg: &str = "Incoming TCP listener should never return empty option";
            let tcp_stream = self.incoming.next().await.expect(err_msg)?;

            self.factory.create_connection(tcp_stream)
        }
    }
}

pub mod connection {

    use crate::io::stream::{BurrowStream, BurrowTcpStream};
    use anyhow::Result;
    use async_listen::backpressure::{Sender, Token};
    use std::{fmt::Display, net::SocketAddr};
    use tokio::net::TcpStream;

    /// Factory that produces new TCP connection instances.
    ///
    /// For each new instance, factory uses backpressure 'sender' to create the token that
    /// should be destroyed on TCP connection drop.
    ///
    pub struct BurrowTcpConnectionFactory {
        /// Backpressure sender instance.
        /// This will produce tokens for created TCP connections.
        bp_tx: Sender,
    }

    impl BurrowTcpConnectionFactory {
        pub fn new(bp_tx: Sender) -> BurrowTcpConnectionFactory {
            BurrowTcpConnectionFactory { bp_tx }
        }

        pub fn create_connection(&self, tcp_stream: TcpStream) -> Result<BurrowTcpConnection> {
            // Wrap raw TcpStream to the stream wrapper and generate new backpressure token
            // that must be dropped on connection destruction.
            Ok(BurrowTcpConnection {
                peer_addr: tcp_stream.peer_addr()?,
                local_addr: tcp_stream.local_addr()?,
                stream: BurrowStream::new(tcp_stream),
                _token: self.bp_tx.token(),
            })
        }
    }

    pub struct BurrowTcpConnection {
        /// Burrow wrapper of TcpStream
        stream: BurrowTcpStream,
        /// Backpressure token
        _token: Token,
        /// Remote address that this connection is connected to
        peer_addr: SocketAddr,
        /// Local address that this connection is bound to
        local_addr: SocketAddr,
    }

    impl BurrowTcpConnection {
        pub fn peer_addr(&self) -> SocketAddr {
            self.peer_addr
        }

        pub fn local_addr(&self) -> SocketAddr {
            self.local_addr
        }

        pub fn stream_mut(&mut self) -> &mut BurrowTcpStream {
            &mut self.stream
        }
    }

    impl Display for BurrowTcpConnection {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.peer_addr)
        }
    }
}
