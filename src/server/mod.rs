use self::{auth::AuthMethodSelector, handlers::BurrowSocks5Handler};
use crate::{
    common::logging::{log_closed_tcp_conn, log_closed_tcp_conn_with_error, log_opened_tcp_conn},
    net::tcp::{connection::BurrowTcpConnection, listener::BurrowTcpListener},
};
use anyhow::Result;
use log::{error, info, warn};
use std::{net::SocketAddr, sync::Arc};

pub mod auth;

mod handlers;

pub struct BurrowServer<A> {
    addr: SocketAddr,
    conn_limit: usize,
    selector: Arc<A>,
}

impl<A> BurrowServer<A>
where
    A: AuthMethodSelector + Send + Sync + 'static,
{
    pub fn new(addr: SocketAddr, conn_limit: usize, selector: A) -> BurrowServer<A> {
        BurrowServer {
            addr,
            conn_limit,
            selector: Arc::new(selector),
        }
    }

    /// Binds the listener and serves SOCKS5 clients until the first bind
    /// failure. Per-connection failures never escalate to this level.
    pub async fn run(&self) -> Result<()> {
        let mut listener = self.bind().await?;
        loop {
            match listener.accept().await {
                Ok(conn) => self.on_new_peer_connected(conn),
                Err(err) => warn!("Error while accepting the TCP connection: {}", err),
            }
        }
    }

    async fn bind(&self) -> Result<BurrowTcpListener> {
        let listener = BurrowTcpListener::bind(self.addr, self.conn_limit).await?;
        info!("Listening on {}", self.addr);

        Ok(listener)
    }

    fn on_new_peer_connected(&self, conn: BurrowTcpConnection) {
        log_opened_tcp_conn!(conn.peer_addr());

        // Supply handling of the new peer to a separate task: one task per
        // accepted connection, nothing shared across connections.
        let mut handler = BurrowSocks5Handler::new(conn, Arc::clone(&self.selector));

        tokio::spawn(async move {
            let peer_addr = handler.peer_addr();
            match handler.handle().await {
                Ok(()) => log_closed_tcp_conn!(peer_addr),
                Err(err) => log_closed_tcp_conn_with_error!(peer_addr, err),
            }
        });
    }
}
