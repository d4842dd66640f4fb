use crate::proto::socks5::{Command, ReplyStatus};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BurrowError {
    #[error("data has incorrect / corrupted field: {0}")]
    DataError(InvalidValue),
    #[error("failed UTF-8 decoding of domain name: {0}")]
    DomainNameDecodingFailed(std::string::FromUtf8Error),
    #[error("domain name of {0} bytes does not fit into a single length octet")]
    DomainNameTooLong(usize),
    #[error("unsupported SOCKS command {0:?}")]
    UnsupportedSocksCommand(Command),
    #[error("unable to resolve domain name {0}")]
    UnresolvedDomainName(String),
    #[error("malformed target endpoint '{0}'")]
    MalformedTargetEndpoint(String),
    #[error("unable to agree on authentication method")]
    NoAcceptableAuthMethod,
    #[error("proxy replied '{0}' to CONNECT request")]
    HandshakeFailed(ReplyStatus),
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidValue {
    #[error("invalid type of network address {0:#02x}")]
    AddressType(u8),
    #[error("invalid domain name length {0:#02x}")]
    DomainNameLength(u8),
    #[error("invalid version of protocol {0:#02x}")]
    ProtocolVersion(u8),
    #[error("invalid SOCKS command {0:#02x}")]
    SocksCommand(u8),
}
