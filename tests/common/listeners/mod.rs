use anyhow::Result;
use burrow::server::{auth::NoAuthSelector, BurrowServer};
use log::debug;
use std::{future::Future, net::SocketAddr};
use tokio::task::{yield_now, JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

pub mod tcp_echo_server;

macro_rules! cancel_listener {
    ($l:expr) => {
        $l.cancel().await.expect("Failed to cancel async task");
    };
}

pub(crate) use cancel_listener;

pub trait AsyncListener {
    fn name(&self) -> &'static str;

    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn run(self) -> impl Future<Output = AsyncListenerTask> + Send
    where
        Self: Send + Sized + 'static,
    {
        AsyncListenerTask::spawn(self)
    }
}

pub struct AsyncListenerTask {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl AsyncListenerTask {
    /// Spawn listener through tokio::spawn with graceful cancellation ability.
    async fn spawn<T>(mut listener: T) -> AsyncListenerTask
    where
        T: AsyncListener + Send + 'static,
    {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let failure_msg = format!("[AsyncListenerTask] Failure occured while running {} listener", listener.name());

        let handle = tokio::spawn(async move {
            tokio::select! {
                res = listener.listen() => res.expect(&failure_msg),
                _ = token_clone.cancelled() => {
                    debug!(
                        "[AsyncListenerTask] {} listener has been cancelled. Shutting down the task ...",
                        listener.name()
                    );
                }
            }
        });

        yield_now().await;

        AsyncListenerTask { handle, token }
    }

    /// Cancel task and wait for it's termination.
    pub async fn cancel(self) -> Result<(), JoinError> {
        self.token.cancel();
        self.handle.await
    }
}

/*
 * Burrow server listener
 */

pub struct BurrowServerListener {
    server: BurrowServer<NoAuthSelector>,
}

impl BurrowServerListener {
    pub fn new(addr: SocketAddr) -> BurrowServerListener {
        BurrowServerListener {
            server: BurrowServer::new(addr, 1024, NoAuthSelector),
        }
    }
}

impl AsyncListener for BurrowServerListener {
    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.server.run()
    }

    fn name(&self) -> &'static str {
        "Burrow server"
    }
}
