//! Upgrade verification hook.
//!
//! A [`VerifyClient`] runs before the handshake. Rejected requests get a
//! 401 and never reach the registry.

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{header, HeaderMap};

/// What is known about a client at upgrade time.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// `Origin` request header.
    pub origin: Option<String>,
    /// Whether the request arrived over TLS, as reported by
    /// `X-Forwarded-Proto`.
    pub secure: bool,
    pub headers: HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

impl ClientInfo {
    pub fn from_headers(headers: HeaderMap, remote_addr: Option<SocketAddr>) -> Self {
        let origin = headers
            .get(header::ORIGIN)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let secure = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .map(|proto| proto.eq_ignore_ascii_case("https"))
            .unwrap_or(false);

        Self {
            origin,
            secure,
            headers,
            remote_addr,
        }
    }
}

/// Accept or reject an upgrade.
pub trait VerifyClient: Send + Sync {
    fn verify(&self, info: &ClientInfo) -> bool;
}

impl<F> VerifyClient for F
where
    F: Fn(&ClientInfo) -> bool + Send + Sync,
{
    fn verify(&self, info: &ClientInfo) -> bool {
        self(info)
    }
}

/// Accepts every client.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl VerifyClient for AcceptAll {
    fn verify(&self, _info: &ClientInfo) -> bool {
        true
    }
}

/// Accepts clients whose `Origin` is in a fixed set.
#[derive(Debug, Clone, Default)]
pub struct OriginAllowList {
    origins: HashSet<String>,
}

impl OriginAllowList {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            origins: origins.into_iter().map(|o| normalize(o.as_ref())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

impl VerifyClient for OriginAllowList {
    fn verify(&self, info: &ClientInfo) -> bool {
        match &info.origin {
            Some(origin) => self.origins.contains(&normalize(origin)),
            None => false,
        }
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
