//! Client IP extraction from forwarding headers.
//!
//! The first configured header with a non-empty value decides; its first
//! comma-separated token is the client. A token that is not an IP address
//! falls back to the transport peer.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName},
    middleware::Next,
    response::Response,
};

use crate::http::state::AppState;

/// Immediate transport peer, before any header rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Resolved client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealIp(pub IpAddr);

/// Peer used when the connection carries no address (in-process calls).
pub const UNKNOWN_PEER: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

pub fn extract_real_ip(headers: &HeaderMap, names: &[HeaderName], peer: IpAddr) -> IpAddr {
    for name in names {
        if let Some(value) = headers.get(name) {
            let raw = value.to_str().map(str::trim).unwrap_or_default();
            if raw.is_empty() {
                continue;
            }
            let first = raw.split(',').next().map(str::trim).unwrap_or_default();
            return match first.parse() {
                Ok(ip) => ip,
                Err(_) => {
                    tracing::debug!(header = %name, value = %first, "Unparseable client IP, using peer");
                    peer
                }
            };
        }
    }
    peer
}

pub async fn real_ip_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .unwrap_or(UNKNOWN_PEER);

    let settings = state.settings.load();
    let real_ip = extract_real_ip(request.headers(), &settings.real_ip_headers, peer.ip());

    let extensions = request.extensions_mut();
    extensions.insert(PeerAddr(peer));
    extensions.insert(RealIp(real_ip));
    extensions.insert(ConnectInfo(SocketAddr::new(real_ip, peer.port())));

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn names() -> Vec<HeaderName> {
        ["x-forwarded-for", "cf-connecting-ip", "true-client-ip"]
            .into_iter()
            .map(HeaderName::from_static)
            .collect()
    }

    fn peer() -> IpAddr {
        "10.1.2.3".parse().unwrap()
    }

    #[test]
    fn first_forwarded_token_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.5, 10.0.0.1"));
        assert_eq!(extract_real_ip(&headers, &names(), peer()), "203.0.113.5".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn header_priority_is_respected() {
        let mut headers = HeaderMap::new();
        headers.insert("true-client-ip", HeaderValue::from_static("198.51.100.9"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("2001:db8::7"));
        assert_eq!(extract_real_ip(&headers, &names(), peer()), "2001:db8::7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn no_headers_uses_peer() {
        assert_eq!(extract_real_ip(&HeaderMap::new(), &names(), peer()), peer());
    }

    #[test]
    fn garbage_token_uses_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown, 203.0.113.5"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.9"));
        assert_eq!(extract_real_ip(&headers, &names(), peer()), peer());
    }

    #[test]
    fn empty_header_falls_through_to_next() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.9"));
        assert_eq!(extract_real_ip(&headers, &names(), peer()), "198.51.100.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn blank_header_alone_uses_peer() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("   "));
        assert_eq!(extract_real_ip(&headers, &names(), peer()), peer());
    }
}
