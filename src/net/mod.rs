use crate::common::error::{BurrowError, InvalidValue};
use anyhow::{anyhow, bail, ensure, Result};
use bytes::BufMut;
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
};
use tokio::{io::AsyncReadExt, net::lookup_host};

pub mod tcp;

macro_rules! ipv4_socket_address {
    ($ipv4:expr, $port:expr) => {
        Address::SocketAddress(SocketAddr::V4(SocketAddrV4::new($ipv4, $port)))
    };
}

macro_rules! ipv6_socket_address {
    ($ipv6:expr, $port:expr) => {
        Address::SocketAddress(SocketAddr::V6(SocketAddrV6::new($ipv6, $port, 0, 0)))
    };
}

pub(crate) use ipv4_socket_address;
pub(crate) use ipv6_socket_address;

#[rustfmt::skip]
mod consts {
    pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
    pub const SOCKS5_ADDR_TYPE_DOMAIN_NAME: u8 = 0x03;
    pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;
}

/// Endpoint address as it appears on the SOCKS5 wire: either a socket
/// address (ATYP 0x01 / 0x04) or a length-prefixed domain name with
/// a port (ATYP 0x03).
#[rustfmt::skip]
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum Address {
    SocketAddress(SocketAddr),
    DomainName(String, u16)
}

impl Address {
    /// Reads ATYP octet followed by the matching address payload and
    /// the big-endian port.
    pub async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        use consts::*;
        let address_type = stream.read_u8().await?;

        match address_type {
            SOCKS5_ADDR_TYPE_IPV4 => Address::read_ipv4(stream).await,
            SOCKS5_ADDR_TYPE_IPV6 => Address::read_ipv6(stream).await,
            SOCKS5_ADDR_TYPE_DOMAIN_NAME => Address::read_domain_name(stream).await,
            _ => bail!(BurrowError::DataError(InvalidValue::AddressType(address_type))),
        }
    }

    /// Writes ATYP octet, address payload and big-endian port to `buf`.
    pub fn write_to<T: BufMut>(&self, buf: &mut T) {
        match self {
            Address::SocketAddress(SocketAddr::V4(ipv4_addr)) => Address::write_ipv4(buf, ipv4_addr),
            Address::SocketAddress(SocketAddr::V6(ipv6_addr)) => Address::write_ipv6(buf, ipv6_addr),
            Address::DomainName(name, port) => Address::write_domain_name(buf, name, *port),
        }
    }

    /// Builds an address from a textual `host:port` endpoint, the way the
    /// proxy client advertises targets:
    /// * `localhost` maps to IPv4 loopback, not to a domain name
    /// * IPv4 / IPv6 literals (the latter with or without brackets) keep
    ///   their address family
    /// * anything else becomes a domain name
    pub fn from_target_str(target: &str) -> Result<Address> {
        let (host, port) = target
            .rsplit_once(':')
            .ok_or(BurrowError::MalformedTargetEndpoint(target.to_string()))?;

        let port = port
            .parse::<u16>()
            .map_err(|_| BurrowError::MalformedTargetEndpoint(target.to_string()))?;

        let host = host.trim_start_matches('[').trim_end_matches(']');

        if host.eq_ignore_ascii_case("localhost") {
            return Ok(ipv4_socket_address!(Ipv4Addr::LOCALHOST, port));
        }
        if let Ok(ipv4) = host.parse::<Ipv4Addr>() {
            return Ok(ipv4_socket_address!(ipv4, port));
        }
        if let Ok(ipv6) = host.parse::<Ipv6Addr>() {
            return Ok(ipv6_socket_address!(ipv6, port));
        }

        // Domain name must fit into the single length octet preceding it.
        if host.len() > u8::MAX as usize {
            bail!(BurrowError::DomainNameTooLong(host.len()));
        }

        Ok(Address::DomainName(host.to_string(), port))
    }

    pub async fn to_socket_addr(&self) -> Result<SocketAddr> {
        match self {
            Address::SocketAddress(sock_addr) => Ok(*sock_addr),
            Address::DomainName(hostname, port) => {
                // Resolve by means of builtin tokio DNS resolver
                let resolved_names = lookup_host(format!("{hostname:}:{port:}")).await?;
                // Take first found
                resolved_names
                    .into_iter()
                    .nth(0)
                    .ok_or(anyhow!(BurrowError::UnresolvedDomainName(hostname.to_string())))
            }
        }
    }

    fn write_ipv4<T: BufMut>(bytes: &mut T, ipv4_addr: &SocketAddrV4) {
        bytes.put_u8(consts::SOCKS5_ADDR_TYPE_IPV4);
        bytes.put_slice(&ipv4_addr.ip().octets());
        bytes.put_u16(ipv4_addr.port());
    }

    fn write_ipv6<T: BufMut>(bytes: &mut T, ipv6_addr: &SocketAddrV6) {
        bytes.put_u8(consts::SOCKS5_ADDR_TYPE_IPV6);
        bytes.put_slice(&ipv6_addr.ip().octets());
        bytes.put_u16(ipv6_addr.port());
    }

    fn write_domain_name<T: BufMut>(bytes: &mut T, name: &str, port: u16) {
        debug_assert!(name.len() <= u8::MAX as usize, "should be rejected before encoding");
        bytes.put_u8(consts::SOCKS5_ADDR_TYPE_DOMAIN_NAME);
        bytes.put_u8(name.len() as u8);
        bytes.put_slice(name.as_bytes());
        bytes.put_u16(port);
    }

    async fn read_ipv4<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        let ipv4 = Ipv4Addr::from(stream.read_u32().await?);
        let port = stream.read_u16().await?;

        Ok(ipv4_socket_address!(ipv4, port))
    }

    async fn read_ipv6<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        let mut octets = [0u8; 16];
        stream.read_exact(&mut octets).await?;
        let port = stream.read_u16().await?;

        Ok(ipv6_socket_address!(Ipv6Addr::from(octets), port))
    }

    async fn read_domain_name<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Address> {
        let len = stream.read_u8().await?;
        // Domain name occupies 1 to 255 bytes on the wire.
        ensure!(len > 0, BurrowError::DataError(InvalidValue::DomainNameLength(len)));

        let mut buf = vec![0u8; len as usize];
        stream.read_exact(&mut buf).await?;

        let name = String::from_utf8(buf).map_err(BurrowError::DomainNameDecodingFailed)?;
        let port = stream.read_u16().await?;

        Ok(Address::DomainName(name, port))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::SocketAddress(sock) => write!(f, "{sock:}"),
            Address::DomainName(name, port) => write!(f, "{name:}:{port:}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_localhost_as_ipv4_loopback() {
        assert_eq!(
            ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 1080),
            Address::from_target_str("localhost:1080").unwrap()
        );
        assert_eq!(
            ipv4_socket_address!(Ipv4Addr::new(127, 0, 0, 1), 443),
            Address::from_target_str("LocalHost:443").unwrap()
        );
    }

    #[test]
    fn parse_address_literals() {
        assert_eq!(
            ipv4_socket_address!(Ipv4Addr::new(8, 8, 8, 8), 53),
            Address::from_target_str("8.8.8.8:53").unwrap()
        );
        assert_eq!(
            ipv6_socket_address!(Ipv6Addr::LOCALHOST, 8080),
            Address::from_target_str("[::1]:8080").unwrap()
        );
    }

    #[test]
    fn parse_domain_name() {
        assert_eq!(
            Address::DomainName("example.com".to_string(), 80),
            Address::from_target_str("example.com:80").unwrap()
        );
    }

    #[test]
    fn reject_malformed_targets() {
        assert!(Address::from_target_str("no-port-at-all").is_err());
        assert!(Address::from_target_str("example.com:66666").is_err());
        assert!(Address::from_target_str(&format!("{}:80", "a".repeat(300))).is_err());
    }
}
