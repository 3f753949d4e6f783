// src/utils/gate.rs

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::{
    config::{Config, GatePolicy},
    error::AppError,
};

/// Outcome of checking one request against the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The path is not admin-prefixed; the gate has no opinion.
    NotGuarded,
    Allowed,
    Denied,
}

/// IP allow-list in front of admin-prefixed paths.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: GatePolicy,
    prefixes: Vec<String>,
    trusted_proxies: Option<Vec<IpAddr>>,
}

impl AccessGate {
    pub fn new(policy: GatePolicy, prefixes: Vec<String>) -> Self {
        let prefixes = prefixes
            .into_iter()
            .map(|p| p.trim_end_matches('/').to_string())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            policy,
            prefixes,
            trusted_proxies: None,
        }
    }

    /// Only believe forwarding headers when the TCP peer is one of `proxies`.
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = Some(proxies.into_iter().map(canonical).collect());
        self
    }

    pub fn from_config(config: &Config) -> Self {
        let gate = Self::new(
            config.gate_policy.clone(),
            config.admin_path_prefixes.clone(),
        );
        match &config.trusted_proxies {
            Some(proxies) => gate.with_trusted_proxies(proxies.clone()),
            None => gate,
        }
    }

    /// Client IP for this request. A peer outside the trusted proxies is
    /// taken at its word and its forwarding headers are ignored.
    pub fn resolve_client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        match &self.trusted_proxies {
            Some(trusted) => {
                let peer_ip = peer.map(|addr| canonical(addr.ip()));
                if peer_ip.is_some_and(|ip| trusted.contains(&ip)) {
                    client_ip(headers, peer)
                } else {
                    peer_ip
                }
            }
            None => client_ip(headers, peer),
        }
    }

    /// `/api/admin` guards `/api/admin` and `/api/admin/...`, not `/api/administer`.
    pub fn guards(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    pub fn decide(&self, path: &str, client_ip: Option<IpAddr>) -> GateDecision {
        if !self.guards(path) {
            return GateDecision::NotGuarded;
        }
        match (&self.policy, client_ip) {
            (GatePolicy::Disabled, _) => GateDecision::Allowed,
            (GatePolicy::AllowList(allowed), Some(ip)) if allowed.contains(&canonical(ip)) => {
                GateDecision::Allowed
            }
            _ => GateDecision::Denied,
        }
    }
}

/// IPv4-mapped IPv6 addresses compare as their IPv4 form.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

fn parse_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|addr| addr.ip()))
}

/// Resolves the client IP: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the TCP peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(parse_ip);

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_ip)
    };

    forwarded
        .or_else(real_ip)
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(canonical)
}

/// Axum Middleware: Access Gate.
///
/// Runs for every request. Requests to admin-prefixed paths from an IP that is
/// not on the allow-list are answered with 403 and never reach a handler.
pub async fn access_gate_middleware(
    State(gate): State<AccessGate>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = gate.resolve_client_ip(req.headers(), peer);
    let path = req.uri().path().to_owned();

    match gate.decide(&path, ip) {
        GateDecision::NotGuarded => Ok(next.run(req).await),
        GateDecision::Allowed => {
            tracing::debug!(?ip, path = %path, "Access gate allowed request");
            Ok(next.run(req).await)
        }
        GateDecision::Denied => {
            tracing::warn!(?ip, path = %path, "Access gate denied request");
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn gate(allowed: &[&str]) -> AccessGate {
        AccessGate::new(
            GatePolicy::AllowList(allowed.iter().map(|ip| ip.parse().unwrap()).collect()),
            vec!["/api/admin".to_string()],
        )
    }

    #[test]
    fn only_admin_prefixed_paths_are_guarded() {
        let gate = gate(&["127.0.0.1"]);
        assert!(gate.guards("/api/admin"));
        assert!(gate.guards("/api/admin/questions"));
        assert!(!gate.guards("/api/administer"));
        assert!(!gate.guards("/api/questions"));
        assert_eq!(gate.decide("/api/questions", None), GateDecision::NotGuarded);
    }

    #[test]
    fn allow_list_decisions() {
        let gate = gate(&["10.1.2.3"]);
        let path = "/api/admin/questions";
        assert_eq!(gate.decide(path, Some("10.1.2.3".parse().unwrap())), GateDecision::Allowed);
        assert_eq!(gate.decide(path, Some("10.1.2.4".parse().unwrap())), GateDecision::Denied);
        assert_eq!(gate.decide(path, None), GateDecision::Denied);
    }

    #[test]
    fn disabled_gate_lets_everyone_through() {
        let gate = AccessGate::new(GatePolicy::Disabled, vec!["/api/admin".into()]);
        assert_eq!(gate.decide("/api/admin/questions", None), GateDecision::Allowed);
    }

    #[test]
    fn resolves_forwarded_header_first() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.2".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();

        assert_eq!(client_ip(&headers, Some(peer)), Some("203.0.113.9".parse().unwrap()));

        headers.remove("x-forwarded-for");
        assert_eq!(client_ip(&headers, Some(peer)), Some("198.51.100.2".parse().unwrap()));

        headers.remove("x-real-ip");
        assert_eq!(client_ip(&headers, Some(peer)), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(client_ip(&headers, None), None);
    }

    #[test]
    fn mapped_ipv6_matches_ipv4_entry() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "[::ffff:127.0.0.1]:80".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), Some("127.0.0.1".parse().unwrap()));
    }

    #[test]
    fn forwarding_headers_only_count_from_trusted_proxies() {
        let gate = gate(&["127.0.0.1"]).with_trusted_proxies(vec!["10.0.0.2".parse().unwrap()]);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "127.0.0.1".parse().unwrap());

        let direct: SocketAddr = "203.0.113.50:4000".parse().unwrap();
        let ip = gate.resolve_client_ip(&headers, Some(direct));
        assert_eq!(ip, Some("203.0.113.50".parse().unwrap()));
        assert_eq!(gate.decide("/api/admin/questions", ip), GateDecision::Denied);

        let proxy: SocketAddr = "[::ffff:10.0.0.2]:4000".parse().unwrap();
        let ip = gate.resolve_client_ip(&headers, Some(proxy));
        assert_eq!(ip, Some("127.0.0.1".parse().unwrap()));
        assert_eq!(gate.decide("/api/admin/questions", ip), GateDecision::Allowed);
    }

    fn app(gate: AccessGate) -> Router {
        Router::new()
            .route("/api/admin/ping", get(|| async { "admin" }))
            .route("/api/ping", get(|| async { "public" }))
            .layer(middleware::from_fn_with_state(gate, access_gate_middleware))
    }

    fn request(path: &str, forwarded: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(ip) = forwarded {
            builder = builder.header("x-forwarded-for", ip);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn middleware_blocks_before_the_handler() {
        let response = app(gate(&["127.0.0.1"]))
            .oneshot(request("/api/admin/ping", Some("8.8.8.8")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn middleware_passes_allowed_and_public_requests() {
        let response = app(gate(&["127.0.0.1"]))
            .oneshot(request("/api/admin/ping", Some("127.0.0.1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app(gate(&["127.0.0.1"]))
            .oneshot(request("/api/ping", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
