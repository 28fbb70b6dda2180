//! Client address resolution for the rate limiter.
//!
//! The server normally sits behind a reverse proxy, so the socket peer is
//! the proxy and the caller's address arrives in a forwarding header.
//! Values that do not parse as an IP fall through to the next source.

use actix_web::HttpRequest;
use std::net::IpAddr;

fn parse_ip(raw: &str) -> Option<String> {
    let raw = raw.trim();
    raw.parse::<IpAddr>().ok().map(|_| raw.to_string())
}

/// The caller's address: the first hop of `X-Forwarded-For` if present,
/// then `X-Real-IP`, then the socket peer.
pub fn extract_client_ip(req: &HttpRequest) -> Option<String> {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    // Only the first hop is client-supplied truth worth keying on; the
    // rest of the chain is appended by intermediate proxies.
    if let Some(found) = header("x-forwarded-for")
        .and_then(|chain| chain.split(',').next())
        .and_then(parse_ip)
    {
        return Some(found);
    }

    if let Some(found) = header("x-real-ip").and_then(parse_ip) {
        return Some(found);
    }

    req.peer_addr().map(|peer| peer.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forwarded_chain_yields_first_hop() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 70.41.3.18, 150.172.238.178"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("203.0.113.7".to_string()));
    }

    #[test]
    fn unparseable_forwarded_value_falls_through() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "unknown"))
            .insert_header(("X-Real-IP", "198.51.100.4"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), Some("198.51.100.4".to_string()));
    }

    #[test]
    fn real_ip_accepts_ipv6() {
        let req = TestRequest::default()
            .insert_header(("X-Real-IP", "2001:db8:85a3::8a2e:370:7334"))
            .to_http_request();
        assert_eq!(
            extract_client_ip(&req),
            Some("2001:db8:85a3::8a2e:370:7334".to_string())
        );
    }

    #[test]
    fn bare_request_resolves_to_nothing() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), None);
    }
}
