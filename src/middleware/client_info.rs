//! Datos del cliente para auditoría y rate limiting: IP y user agent

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};

use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// IP del cliente. X-Forwarded-For solo cuenta con `trust_proxy`; si no, la dirección del socket
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>, trust_proxy: bool) -> Option<String> {
    let forwarded = if trust_proxy {
        headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    } else {
        None
    };

    forwarded.or_else(|| remote.map(|addr| addr.ip().to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let remote = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(Self {
            ip: client_ip(&parts.headers, remote, state.config.trust_proxy_headers),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"));
        headers
    }

    #[test]
    fn test_forwarded_first_hop_behind_trusted_proxy() {
        let remote: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(
            client_ip(&forwarded_headers(), Some(remote), true),
            Some("203.0.113.7".to_string())
        );
    }

    #[test]
    fn test_forwarded_header_ignored_without_trusted_proxy() {
        let remote: SocketAddr = "198.51.100.4:5000".parse().unwrap();
        assert_eq!(
            client_ip(&forwarded_headers(), Some(remote), false),
            Some("198.51.100.4".to_string())
        );
        assert_eq!(client_ip(&forwarded_headers(), None, false), None);
    }

    #[test]
    fn test_socket_address_fallback() {
        let remote: SocketAddr = "192.168.1.20:5000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(remote), true), Some("192.168.1.20".to_string()));
        assert_eq!(client_ip(&HeaderMap::new(), None, true), None);
    }
}
