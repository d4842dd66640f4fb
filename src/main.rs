use anyhow::Result;
use burrow::{
    config::{self, BurrowConfig},
    server::{auth::NoAuthSelector, BurrowServer},
};
use clap::Parser;
use log4rs::config::Deserializers;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    log4rs::init_file(config::LOG4RS_CONFIG_FILE_PATH, Deserializers::default()).unwrap();
    // Parse config
    let config = BurrowConfig::parse();
    let bind_addr = SocketAddr::new(config.bind_ipv4().into(), config.bind_port());
    // Create server with disabled authentication
    let server = BurrowServer::new(bind_addr, config.tcp_conn_limit(), NoAuthSelector);
    // Bind and serve clients "forever"
    server.run().await?;
    Ok(())
}
