use super::AsyncListener;
use anyhow::Result;
use log::debug;
use std::{future::Future, net::SocketAddr};
use tokio::net::TcpListener;

/*
 * TCP Echo server listener
 */
pub struct TcpEchoServer {
    inner: TcpListener,
}

impl TcpEchoServer {
    pub async fn bind(addr: SocketAddr) -> TcpEchoServer {
        debug!("[TcpEchoServer] Binding TCP echo server to {addr}");
        TcpEchoServer {
            inner: TcpListener::bind(addr).await.unwrap(),
        }
    }
}

impl AsyncListener for TcpEchoServer {
    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send {
        async {
            loop {
                let (mut stream, addr) = self.inner.accept().await?;
                debug!("[TcpEchoServer] Accepted connection from {addr:}");

                tokio::spawn(async move {
                    let (mut read_half, mut write_half) = stream.split();
                    match tokio::io::copy(&mut read_half, &mut write_half).await {
                        Ok(n) => debug!("[TcpEchoServer] Echoed {n:} bytes back to {addr:}"),
                        Err(err) => debug!("[TcpEchoServer] Connection with {addr:} failed: {err:}"),
                    }
                });
            }
        }
    }

    fn name(&self) -> &'static str {
        "TCP echo server"
    }
}
