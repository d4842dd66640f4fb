use log::LevelFilter;
use log4rs_test_utils::test_logging::init_logging_once_for;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use utils::assertions::assert_eq_vectors;

pub mod listeners;

pub fn init_logging() {
    init_logging_once_for(None, LevelFilter::Debug, "{h({({l}):5.5})} [{M}] {f}:{L}: {m}{n}");
}

pub fn next_available_address() -> SocketAddr {
    static PORT: AtomicUsize = AtomicUsize::new(32000);

    format!("127.0.0.1:{}", PORT.fetch_add(1, Ordering::AcqRel)).parse().unwrap()
}

/// Establish connection with passed <code>endpoint</code> through <code>socks5_proxy</code> with
/// an independent SOCKS5 client implementation. Then send data and expect it to be fully
/// returned by the endpoint.
pub async fn ping_pong_data_through_socks5(endpoint: SocketAddr, socks5_proxy: SocketAddr) {
    // Create TCP stream.
    let mut socks5_stream = TcpStream::connect(socks5_proxy)
        .await
        .expect("Expect successful TCP connection established with proxy");

    // Establish SOCKS5 connection over TCP stream.
    async_socks5::connect(&mut socks5_stream, endpoint, None)
        .await
        .expect("Expect successfully established SOCKS5 connection");

    // Write generated buffer.
    let write_buff = utils::generate_data(1024);
    socks5_stream.write_all(&write_buff).await.expect("Expect all data to be written");

    // Expect it to be fully received back.
    let mut read_buff = vec![0u8; 1024];
    socks5_stream.read_exact(&mut read_buff).await.expect("Expect all data to be read");

    // Shutdown write direction.
    socks5_stream.shutdown().await.expect("Expect successful TCP stream shutdown");

    // Check that written and read data are equal.
    assert_eq_vectors(&write_buff, &read_buff);
}

pub mod utils {

    use rand::Rng;

    pub mod assertions {

        use std::fmt::Debug;

        pub fn assert_eq_vectors<T: Eq + Debug>(expected: &[T], actual: &[T]) {
            let matching = expected
                .iter()
                .zip(actual)
                .filter(|&(r, w)| {
                    assert_eq!(r, w);
                    r == w
                })
                .count();

            assert_eq!(expected.len(), matching, "whole buffers (write & read) should be equal");
        }
    }

    pub fn generate_data(len: usize) -> Vec<u8> {
        let v = vec![0u8; len];
        let mut rng = rand::thread_rng();

        v.iter().map(|_| rng.gen::<u8>()).collect()
    }
}
