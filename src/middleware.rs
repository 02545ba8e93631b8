/* src/middleware.rs */

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::request::Parts,
    response::Response,
};
use futures_util::future::BoxFuture;
use std::{
    convert::Infallible,
    net::SocketAddr,
    task::{Context, Poll},
};
use tower::{Layer, Service};

use crate::resolver::{HeaderSet, Resolver};

/// Extension that holds the resolved client address.
///
/// The address is kept as text; it is empty when `X-Forwarded-For` held only
/// local addresses and no `X-Real-Ip` was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealIp(pub String);

impl RealIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Layer that resolves the client address once per request and stores it as
/// a [`RealIp`] extension.
///
/// The peer address comes from `ConnectInfo<SocketAddr>`, so the router must be
/// served with `into_make_service_with_connect_info::<SocketAddr>()`.
///
/// # Examples
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use realip::{RealIp, RealIpLayer};
///
/// async fn handler(RealIp(ip): RealIp) -> String {
///     ip
/// }
///
/// let app: Router = Router::new()
///     .route("/", get(handler))
///     .layer(RealIpLayer::new());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RealIpLayer {
    resolver: Resolver,
}

impl RealIpLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a resolver with a custom reserved range table.
    pub fn with_resolver(resolver: Resolver) -> Self {
        Self { resolver }
    }
}

impl<S> Layer<S> for RealIpLayer {
    type Service = RealIpService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RealIpService {
            inner,
            resolver: self.resolver.clone(),
        }
    }
}

/// Service produced by [`RealIpLayer`].
#[derive(Debug, Clone)]
pub struct RealIpService<S> {
    inner: S,
    resolver: Resolver,
}

impl<S> Service<Request> for RealIpService<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let peer = peer_addr(req.extensions());
        let resolution = self
            .resolver
            .resolve(&peer, &HeaderSet::from_http(req.headers()));

        tracing::trace!(
            peer = %peer,
            address = %resolution.address,
            source = ?resolution.source,
            "resolved client address"
        );

        req.extensions_mut().insert(RealIp(resolution.address));

        let future = self.inner.call(req);
        Box::pin(future)
    }
}

/// `ip:port` of the connection, or empty when connect info is unavailable.
fn peer_addr(extensions: &axum::http::Extensions) -> String {
    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for RealIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(real_ip) = parts.extensions.get::<RealIp>() {
            return Ok(real_ip.clone());
        }

        // Layer not installed; resolve from this request alone.
        let peer = peer_addr(&parts.extensions);
        let headers = HeaderSet::from_http(&parts.headers);
        Ok(RealIp(Resolver::new().real_ip(&peer, &headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, routing::get};
    use tower::ServiceExt;

    async fn echo(RealIp(ip): RealIp) -> String {
        ip
    }

    fn request(peer: Option<&str>, headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        if let Some(peer) = peer {
            let addr: SocketAddr = peer.parse().unwrap();
            builder = builder.extension(ConnectInfo(addr));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(app: Router, req: Request) -> String {
        let response = app.oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route("/", get(echo))
            .layer(RealIpLayer::new())
    }

    #[tokio::test]
    async fn test_layer_uses_peer_without_headers() {
        let req = request(Some("203.0.113.5:4000"), &[]);
        assert_eq!(body_text(app(), req).await, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_layer_keeps_ipv6_brackets() {
        let req = request(Some("[2001:db8::1]:4000"), &[]);
        assert_eq!(body_text(app(), req).await, "[2001:db8::1]");
    }

    #[tokio::test]
    async fn test_layer_skips_local_forwarded_hops() {
        let req = request(
            Some("10.0.0.2:4000"),
            &[("X-Forwarded-For", "10.0.0.1, 203.0.113.9, 198.51.100.2")],
        );
        assert_eq!(body_text(app(), req).await, "203.0.113.9");
    }

    #[tokio::test]
    async fn test_layer_falls_back_to_real_ip() {
        let req = request(
            Some("10.0.0.2:4000"),
            &[
                ("x-forwarded-for", "10.0.0.1, 192.168.1.1"),
                ("x-real-ip", "198.51.100.7"),
            ],
        );
        assert_eq!(body_text(app(), req).await, "198.51.100.7");
    }

    #[tokio::test]
    async fn test_layer_with_custom_resolver() {
        let ranges = crate::ReservedRanges::from_cidrs(["198.51.100.0/24"]).unwrap();
        let app = Router::new()
            .route("/", get(echo))
            .layer(RealIpLayer::with_resolver(Resolver::new().with_ranges(ranges)));
        let req = request(None, &[("X-Forwarded-For", "198.51.100.2, 10.0.0.1")]);
        assert_eq!(body_text(app, req).await, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_extractor_without_layer() {
        let app = Router::new().route("/", get(echo));
        let req = request(None, &[("X-Real-Ip", "198.51.100.7")]);
        assert_eq!(body_text(app, req).await, "198.51.100.7");
    }

    #[tokio::test]
    async fn test_extractor_without_layer_or_connect_info() {
        let app = Router::new().route("/", get(echo));
        assert_eq!(body_text(app, request(None, &[])).await, "");
    }
}
