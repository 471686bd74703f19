//! Conversion from axum requests to [`RawRequest`]

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::{header, HeaderMap, Uri};
use bytes::BytesMut;
use futures::StreamExt;

use crate::capture::RawRequest;

/// Host the request was addressed to, port included
///
/// Prefers the `Host` header and falls back to the URI authority (HTTP/2).
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> String {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_default()
}

/// Read a request into a [`RawRequest`]
///
/// Headers follow `HeaderMap` order, not wire order: names are lowercased
/// and repeated values are grouped under the name's first appearance.
///
/// Reads at most `max_body_size + 1` body bytes; the extra byte tells the
/// capture codec the body was cut. The rest of an oversized body is never
/// buffered.
pub async fn raw_request(req: Request, max_body_size: usize) -> RawRequest {
    let (parts, body) = req.into_parts();
    let limit = max_body_size.saturating_add(1);

    let mut buf = BytesMut::new();
    let mut stream = body.into_data_stream();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => {
                let room = limit - buf.len();
                buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
                if buf.len() >= limit {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Body read failed, keeping partial body");
                break;
            }
        }
    }

    // Header names come out lowercased; values are grouped per name in
    // first-seen order
    let headers = parts
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    RawRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().unwrap_or_default().to_string(),
        protocol: format!("{:?}", parts.version),
        host: request_host(&parts.headers, &parts.uri),
        headers,
        body: buf.freeze(),
        remote_addr: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[tokio::test]
    async fn test_raw_request_fields() {
        let addr: SocketAddr = "203.0.113.9:40000".parse().unwrap();
        let mut req = axum::http::Request::builder()
            .method("PATCH")
            .uri("/items/7?force=true")
            .header("Host", "Hooks.Example.com:8080")
            .header("X-One", "1")
            .header("X-Many", "a")
            .header("X-Many", "b")
            .body(Body::from("payload"))
            .unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let raw = raw_request(req, 1024).await;

        assert_eq!(raw.method, "PATCH");
        assert_eq!(raw.path, "/items/7");
        assert_eq!(raw.query, "force=true");
        assert_eq!(raw.protocol, "HTTP/1.1");
        assert_eq!(raw.host, "Hooks.Example.com:8080");
        assert_eq!(&raw.body[..], b"payload");
        assert_eq!(raw.remote_addr, Some(addr));

        let many: Vec<&str> = raw
            .headers
            .iter()
            .filter(|(n, _)| n == "x-many")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(many, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_headers_grouped_by_name() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("X-A", "1")
            .header("X-B", "2")
            .header("X-A", "3")
            .body(Body::empty())
            .unwrap();

        let raw = raw_request(req, 16).await;

        let pairs: Vec<(&str, &str)> = raw
            .headers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        assert_eq!(pairs, [("x-a", "1"), ("x-a", "3"), ("x-b", "2")]);
    }

    #[tokio::test]
    async fn test_body_read_stops_one_past_cap() {
        let req = axum::http::Request::builder()
            .uri("/")
            .header("Host", "h")
            .body(Body::from(vec![1u8; 500]))
            .unwrap();

        let raw = raw_request(req, 100).await;

        assert_eq!(raw.body.len(), 101);
    }

    #[test]
    fn test_request_host_falls_back_to_authority() {
        let uri: Uri = "http://h2.example.com:8443/path".parse().unwrap();
        assert_eq!(request_host(&HeaderMap::new(), &uri), "h2.example.com:8443");
        assert_eq!(request_host(&HeaderMap::new(), &Uri::from_static("/")), "");
    }
}
