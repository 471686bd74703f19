//! Captured request records
//!
//! A `CapturedRequest` is built once per inbound request and then shared
//! read-only (behind an `Arc`) by every viewer it is delivered to.

use std::net::SocketAddr;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::registry::host::without_port;

/// An inbound request as handed over by the HTTP boundary
///
/// The boundary reads at most one byte past the body cap so that the codec
/// can tell a body that fits from one that had to be cut.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Request method (`GET`, `POST`, ...)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// Raw query string without the leading `?`
    pub query: String,
    /// Protocol version (`HTTP/1.1`)
    pub protocol: String,
    /// Literal `Host` header value, port included
    pub host: String,
    /// Headers in arrival order, duplicates preserved
    pub headers: Vec<(String, String)>,
    /// Body bytes read so far
    pub body: Bytes,
    /// Address of the sender, when the transport exposes one
    pub remote_addr: Option<SocketAddr>,
}

impl RawRequest {
    /// Create a request with the given method, host and path
    pub fn new(method: impl Into<String>, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            host: host.into(),
            path: path.into(),
            protocol: "HTTP/1.1".to_string(),
            ..Default::default()
        }
    }

    /// Append a header, keeping any existing value under the same name
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the raw query string
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// Set the body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the sender address
    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }
}

/// Immutable record of one caught request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRequest {
    /// When the request was captured
    pub time: DateTime<Utc>,
    /// Hostname as the sender wrote it, port removed (for display)
    pub host: String,
    pub method: String,
    pub path: String,
    pub query: String,
    pub protocol: String,
    /// Headers in arrival order, duplicates preserved
    pub headers: Vec<(String, String)>,
    /// Body, cut to the configured cap
    pub body: Bytes,
    /// Whether the body was cut
    pub body_truncated: bool,
    pub remote_addr: Option<SocketAddr>,
}

impl CapturedRequest {
    /// Build a record from a raw request
    ///
    /// Total: the only adjustment ever made is cutting the body to
    /// `max_body_size` bytes. The cut is a cheap `Bytes` slice, not a copy.
    pub fn capture(raw: RawRequest, max_body_size: usize) -> Self {
        let body_truncated = raw.body.len() > max_body_size;
        let body = if body_truncated {
            raw.body.slice(..max_body_size)
        } else {
            raw.body
        };

        Self {
            time: Utc::now(),
            host: without_port(&raw.host).to_string(),
            method: raw.method,
            path: raw.path,
            query: raw.query,
            protocol: raw.protocol,
            headers: raw.headers,
            body,
            body_truncated,
            remote_addr: raw.remote_addr,
        }
    }

    /// All values recorded for a header name, case-insensitively, in order
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webhook() -> RawRequest {
        RawRequest::new("POST", "Hooks.Example.com:8080", "/github")
            .query("delivery=1&retry=0")
            .header("Content-Type", "application/json")
            .header("Set-Cookie", "a=1")
            .header("X-Trace", "abc")
            .header("Set-Cookie", "b=2")
            .body(Bytes::from_static(b"{\"ok\":true}"))
            .remote_addr("10.0.0.7:51234".parse().unwrap())
    }

    #[test]
    fn test_capture_preserves_request_line() {
        let captured = CapturedRequest::capture(webhook(), 1024);

        assert_eq!(captured.method, "POST");
        assert_eq!(captured.path, "/github");
        assert_eq!(captured.query, "delivery=1&retry=0");
        assert_eq!(captured.protocol, "HTTP/1.1");
        assert_eq!(captured.remote_addr, Some("10.0.0.7:51234".parse().unwrap()));
    }

    #[test]
    fn test_capture_keeps_display_host_case() {
        let captured = CapturedRequest::capture(webhook(), 1024);
        assert_eq!(captured.host, "Hooks.Example.com");
    }

    #[test]
    fn test_capture_preserves_header_order_and_duplicates() {
        let captured = CapturedRequest::capture(webhook(), 1024);

        let names: Vec<&str> = captured.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Content-Type", "Set-Cookie", "X-Trace", "Set-Cookie"]);

        let cookies: Vec<&str> = captured.header_values("set-cookie").collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
    }

    #[test]
    fn test_body_under_cap_unchanged() {
        let captured = CapturedRequest::capture(webhook(), 1024);
        assert_eq!(&captured.body[..], b"{\"ok\":true}");
        assert!(!captured.body_truncated);
    }

    #[test]
    fn test_body_at_cap_unchanged() {
        let raw = RawRequest::new("PUT", "h", "/").body(vec![7u8; 32]);
        let captured = CapturedRequest::capture(raw, 32);

        assert_eq!(captured.body.len(), 32);
        assert!(!captured.body_truncated);
    }

    #[test]
    fn test_body_over_cap_truncated_to_cap() {
        let body: Vec<u8> = (0..100u8).collect();
        let raw = RawRequest::new("POST", "h", "/").body(body.clone());
        let captured = CapturedRequest::capture(raw, 40);

        assert_eq!(captured.body.len(), 40);
        assert_eq!(&captured.body[..], &body[..40]);
        assert!(captured.body_truncated);
    }

    #[test]
    fn test_zero_cap_drops_whole_body() {
        let raw = RawRequest::new("POST", "h", "/").body(Bytes::from_static(b"x"));
        let captured = CapturedRequest::capture(raw, 0);

        assert!(captured.body.is_empty());
        assert!(captured.body_truncated);
    }
}
