pub mod client;
pub mod common;
pub mod config;
pub mod io;
pub mod net;
pub mod proto;
pub mod server;
