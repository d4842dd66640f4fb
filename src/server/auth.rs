use crate::proto::socks5::consts::auth::{SOCKS5_AUTH_METHOD_NONE, SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE};

/// Strategy that picks the authentication method for a fresh connection.
///
/// Gets the method identifiers exactly as the client advertised them,
/// in wire order, unknown values included. Returning
/// `SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE` (0xff) rejects the client.
///
/// Only the "no authentication" method is implemented end-to-end today;
/// embedders wiring a custom selector must be prepared to run the
/// authentication exchange for whatever method they pick.
pub trait AuthMethodSelector {
    fn select(&self, offered_methods: &[u8]) -> u8;
}

/// Default selector: accept clients that offer "no authentication",
/// reject everything else.
pub struct NoAuthSelector;

impl AuthMethodSelector for NoAuthSelector {
    fn select(&self, offered_methods: &[u8]) -> u8 {
        if offered_methods.contains(&SOCKS5_AUTH_METHOD_NONE) {
            SOCKS5_AUTH_METHOD_NONE
        } else {
            SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::socks5::consts::auth::*;

    #[test]
    fn pick_none_auth_method() {
        let offered = [SOCKS5_AUTH_METHOD_GSSAPI, SOCKS5_AUTH_METHOD_PASSWORD, SOCKS5_AUTH_METHOD_NONE];
        assert_eq!(SOCKS5_AUTH_METHOD_NONE, NoAuthSelector.select(&offered));
    }

    #[test]
    fn reject_without_none_auth_method() {
        let offered = [SOCKS5_AUTH_METHOD_GSSAPI, SOCKS5_AUTH_METHOD_PASSWORD];
        assert_eq!(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, NoAuthSelector.select(&offered));
        assert_eq!(SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE, NoAuthSelector.select(&[]));
    }
}
