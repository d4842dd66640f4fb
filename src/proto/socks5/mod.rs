///
/// Socks5 protocol implementation details
///
/// RFC 1928
/// https://datatracker.ietf.org/doc/html/rfc1928#ref-1
///
use crate::common::error::{BurrowError, InvalidValue};
use std::fmt::{self, Display};

pub mod request;
pub mod response;


#[rustfmt::skip]
pub mod consts {
    pub const SOCKS5_VERSION: u8 = 0x05;

    pub mod auth {
        pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
        pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
        pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
        pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xff;
    }

    pub mod command {
        pub const SOCKS5_CMD_CONNECT: u8 = 0x01;
        pub const SOCKS5_CMD_BIND: u8 = 0x02;
        pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;
    }

    pub mod reply {
        pub const SOCKS5_REPLY_SUCCEEDED: u8 = 0x00;
        pub const SOCKS5_REPLY_GENERAL_FAILURE: u8 = 0x01;
        pub const SOCKS5_REPLY_CONNECTION_NOT_ALLOWED: u8 = 0x02;
        pub const SOCKS5_REPLY_NETWORK_UNREACHABLE: u8 = 0x03;
        pub const SOCKS5_REPLY_HOST_UNREACHABLE: u8 = 0x04;
        pub const SOCKS5_REPLY_CONNECTION_REFUSED: u8 = 0x05;
        pub const SOCKS5_REPLY_TTL_EXPIRED: u8 = 0x06;
        pub const SOCKS5_REPLY_COMMAND_NOT_SUPPORTED: u8 = 0x07;
        pub const SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED: u8 = 0x08;
    }
}

#[repr(u8)]
#[rustfmt::skip]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Command {
    Connect,
    Bind,
    UdpAssociate
}

impl Command {
    pub fn as_u8(self) -> u8 {
        use consts::command::*;
        match self {
            Command::Connect => SOCKS5_CMD_CONNECT,
            Command::Bind => SOCKS5_CMD_BIND,
            Command::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = BurrowError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use consts::command::*;
        match value {
            SOCKS5_CMD_BIND => Ok(Command::Bind),
            SOCKS5_CMD_CONNECT => Ok(Command::Connect),
            SOCKS5_CMD_UDP_ASSOCIATE => Ok(Command::UdpAssociate),
            _ => Err(BurrowError::DataError(InvalidValue::SocksCommand(value))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyStatus {
    Succeeded,
    GeneralFailure,
    ConnectionNotAllowed,
    NetworkUnreachable,
    HostUnreachable,
    ConnectionRefused,
    TtlExpired,
    CommandNotSupported,
    AddressTypeNotSupported,
    OtherReply(u8),
}

impl ReplyStatus {
    #[rustfmt::skip]
    pub fn as_u8(self) -> u8 {
        match self {
            ReplyStatus::Succeeded               => consts::reply::SOCKS5_REPLY_SUCCEEDED,
            ReplyStatus::GeneralFailure          => consts::reply::SOCKS5_REPLY_GENERAL_FAILURE,
            ReplyStatus::ConnectionNotAllowed    => consts::reply::SOCKS5_REPLY_CONNECTION_NOT_ALLOWED,
            ReplyStatus::NetworkUnreachable      => consts::reply::SOCKS5_REPLY_NETWORK_UNREACHABLE,
            ReplyStatus::HostUnreachable         => consts::reply::SOCKS5_REPLY_HOST_UNREACHABLE,
            ReplyStatus::ConnectionRefused       => consts::reply::SOCKS5_REPLY_CONNECTION_REFUSED,
            ReplyStatus::TtlExpired              => consts::reply::SOCKS5_REPLY_TTL_EXPIRED,
            ReplyStatus::CommandNotSupported     => consts::reply::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED,
            ReplyStatus::AddressTypeNotSupported => consts::reply::SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED,
            ReplyStatus::OtherReply(other)       => other,
        }
    }

    #[rustfmt::skip]
    pub fn from_u8(code: u8) -> ReplyStatus {
        match code {
            consts::reply::SOCKS5_REPLY_SUCCEEDED                  => ReplyStatus::Succeeded,
            consts::reply::SOCKS5_REPLY_GENERAL_FAILURE            => ReplyStatus::GeneralFailure,
            consts::reply::SOCKS5_REPLY_CONNECTION_NOT_ALLOWED     => ReplyStatus::ConnectionNotAllowed,
            consts::reply::SOCKS5_REPLY_NETWORK_UNREACHABLE        => ReplyStatus::NetworkUnreachable,
            consts::reply::SOCKS5_REPLY_HOST_UNREACHABLE           => ReplyStatus::HostUnreachable,
            consts::reply::SOCKS5_REPLY_CONNECTION_REFUSED         => ReplyStatus::ConnectionRefused,
            consts::reply::SOCKS5_REPLY_TTL_EXPIRED                => ReplyStatus::TtlExpired,
            consts::reply::SOCKS5_REPLY_COMMAND_NOT_SUPPORTED      => ReplyStatus::CommandNotSupported,
            consts::reply::SOCKS5_REPLY_ADDRESS_TYPE_NOT_SUPPORTED => ReplyStatus::AddressTypeNotSupported,
            _ => ReplyStatus::OtherReply(code),
        }
    }
}

impl From<BurrowError> for ReplyStatus {
    fn from(err: BurrowError) -> Self {
        match err {
            BurrowError::UnsupportedSocksCommand(_) => ReplyStatus::CommandNotSupported,
            BurrowError::UnresolvedDomainName(_) => ReplyStatus::HostUnreachable,
            _ => ReplyStatus::GeneralFailure,
        }
    }
}

impl From<anyhow::Error> for ReplyStatus {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<BurrowError>() {
            Ok(burrow_err) => return ReplyStatus::from(burrow_err),
            Err(err) => err,
        };
        // Remaining transport failures reach this point from target dialing
        // only and are all reported as "host unreachable" without further
        // distinction.
        match err.downcast::<std::io::Error>() {
            Ok(_) => ReplyStatus::HostUnreachable,
            Err(_) => ReplyStatus::GeneralFailure,
        }
    }
}

impl Display for ReplyStatus {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReplyStatus::Succeeded => write!(f, "Succeeded"),
            ReplyStatus::AddressTypeNotSupported => write!(f, "Address type not supported"),
            ReplyStatus::CommandNotSupported => write!(f, "Command not supported"),
            ReplyStatus::ConnectionNotAllowed => write!(f, "Connection not allowed"),
            ReplyStatus::ConnectionRefused => write!(f, "Connection refused"),
            ReplyStatus::GeneralFailure => write!(f, "General failure"),
            ReplyStatus::HostUnreachable => write!(f, "Host unreachable"),
            ReplyStatus::NetworkUnreachable => write!(f, "Network unreachable"),
            ReplyStatus::OtherReply(u) => write!(f, "Other reply ({u})"),
            ReplyStatus::TtlExpired => write!(f, "TTL expired"),
        }
    }
}
