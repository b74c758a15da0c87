// src/services/proxy.rs
// DOCUMENTATION: Reverse proxy used by the gateway binary
// PURPOSE: Map a path prefix to an upstream service and relay the exchange

use crate::errors::GalleryError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use reqwest::Client;
use std::time::Duration;

/// Headers copied from the client request to the upstream
const FORWARDED_HEADERS: [&str; 2] = ["content-type", "authorization"];

#[derive(Clone)]
pub struct Proxy {
    client: Client,
    routes: Vec<(String, String)>,
}

impl Proxy {
    pub fn new(routes: Vec<(String, String)>, timeout_ms: u64) -> Result<Self, GalleryError> {
        // Upstreams are internal; environment proxies do not apply
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .no_proxy()
            .build()
            .map_err(|e| GalleryError::InternalError(format!("HTTP client: {}", e)))?;

        Ok(Self { client, routes })
    }

    /// Upstream URL for a request path, or None when no prefix matches
    pub fn resolve_upstream(&self, path: &str, query: &str) -> Option<String> {
        self.routes
            .iter()
            .filter(|(prefix, _)| matches_prefix(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, base)| {
                if query.is_empty() {
                    format!("{}{}", base, path)
                } else {
                    format!("{}{}?{}", base, path, query)
                }
            })
    }

    /// Relay one request and the upstream answer
    pub async fn forward(&self, req: &HttpRequest, body: web::Bytes) -> Result<HttpResponse, GalleryError> {
        let url = self
            .resolve_upstream(req.path(), req.query_string())
            .ok_or_else(|| GalleryError::NotFound("Route".to_string()))?;

        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|_| GalleryError::InvalidInput("Unsupported method".to_string()))?;

        let mut upstream = self.client.request(method, &url);
        for name in FORWARDED_HEADERS {
            if let Some(value) = req.headers().get(name).and_then(|v| v.to_str().ok()) {
                upstream = upstream.header(name, value);
            }
        }

        let existing = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok());
        let peer = req.peer_addr().map(|addr| addr.ip().to_string());
        if let Some(value) = forwarded_for(existing, peer.as_deref()) {
            upstream = upstream.header("x-forwarded-for", value);
        }

        let response = upstream.body(body.to_vec()).send().await.map_err(|e| {
            if e.is_timeout() {
                log::warn!("Upstream timeout for {} {}", req.method(), url);
                GalleryError::GatewayTimeout(url.clone())
            } else {
                log::error!("Upstream request {} {} failed: {}", req.method(), url, e);
                GalleryError::UpstreamError(format!("Service unavailable: {}", e))
            }
        })?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                GalleryError::GatewayTimeout(url.clone())
            } else {
                GalleryError::UpstreamError(format!("Failed to read upstream body: {}", e))
            }
        })?;

        log::debug!("{} {} -> {}", req.method(), url, status);

        let mut builder = HttpResponse::build(status);
        if let Some(content_type) = content_type {
            builder.insert_header(("content-type", content_type));
        }
        Ok(builder.body(bytes.to_vec()))
    }
}

/// `X-Forwarded-For` for the upstream: the client's chain plus the peer we saw
pub fn forwarded_for(existing: Option<&str>, peer: Option<&str>) -> Option<String> {
    let existing = existing.map(str::trim).filter(|v| !v.is_empty());
    match (existing, peer) {
        (Some(chain), Some(peer)) => Some(format!("{}, {}", chain, peer)),
        (None, Some(peer)) => Some(peer.to_string()),
        (Some(chain), None) => Some(chain.to_string()),
        (None, None) => None,
    }
}

/// Prefix match on a path segment boundary
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_routes;

    fn proxy() -> Proxy {
        let routes = default_routes(
            "http://auth:5001",
            "http://gallery:5002/",
            "http://storage:5003",
            "http://search:5004",
            "http://email:5005",
        );
        Proxy::new(routes, 1000).unwrap()
    }

    #[test]
    fn test_resolve_upstream() {
        let p = proxy();
        assert_eq!(
            p.resolve_upstream("/api/auth/login", "").as_deref(),
            Some("http://auth:5001/api/auth/login")
        );
        assert_eq!(
            p.resolve_upstream("/api/images/gallery/1", "status=PENDING").as_deref(),
            Some("http://gallery:5002/api/images/gallery/1?status=PENDING")
        );
        assert_eq!(
            p.resolve_upstream("/api/metadata", "").as_deref(),
            Some("http://search:5004/api/metadata")
        );
    }

    #[test]
    fn test_unknown_prefix() {
        let p = proxy();
        assert!(p.resolve_upstream("/api/authx/login", "").is_none());
        assert!(p.resolve_upstream("/health", "").is_none());
    }

    #[test]
    fn test_forwarded_for_appends_peer() {
        assert_eq!(forwarded_for(None, Some("203.0.113.7")).as_deref(), Some("203.0.113.7"));
        assert_eq!(
            forwarded_for(Some("1.2.3.4"), Some("203.0.113.7")).as_deref(),
            Some("1.2.3.4, 203.0.113.7")
        );
        assert_eq!(forwarded_for(Some(" "), None), None);
    }

    #[actix_web::test]
    async fn test_forward_keeps_clients_apart() {
        use crate::services::security::client_key;
        use actix_web::{App, HttpServer};

        // Upstream answers with the client key it would throttle on
        let server = HttpServer::new(|| {
            App::new().route(
                "/api/auth/login",
                web::post().to(|req: HttpRequest| async move {
                    HttpResponse::Ok().body(client_key(&req, &["127.0.0.1".to_string()]))
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let upstream = format!("http://{}", server.addrs()[0]);
        actix_web::rt::spawn(server.run());

        let routes = default_routes(&upstream, &upstream, &upstream, &upstream, &upstream);
        let p = Proxy::new(routes, 2000).unwrap();

        for client in ["203.0.113.7", "198.51.100.9"] {
            let req = actix_web::test::TestRequest::post()
                .uri("/api/auth/login")
                .peer_addr(format!("{}:50000", client).parse().unwrap())
                .insert_header(("X-Forwarded-For", "10.9.9.9"))
                .to_http_request();
            let resp = p.forward(&req, web::Bytes::new()).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);

            let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
            assert_eq!(body, client.as_bytes());
        }
    }

    #[actix_web::test]
    async fn test_forward_unknown_route() {
        let p = proxy();
        let req = actix_web::test::TestRequest::get().uri("/api/nowhere").to_http_request();
        let result = p.forward(&req, web::Bytes::new()).await;
        assert!(matches!(result, Err(GalleryError::NotFound(_))));
    }
}
