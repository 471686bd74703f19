//! JSON payload sent to viewers
//!
//! One text frame per capture. Headers go out as `[name, value]` pairs so
//! repeated names survive. Bodies that are not UTF-8 are base64-encoded and
//! flagged through `body_encoding`.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::request::CapturedRequest;

/// How the `body` field is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    Utf8,
    Base64,
}

#[derive(Serialize)]
struct WireCapture<'a> {
    #[serde(serialize_with = "rfc3339")]
    time: &'a DateTime<Utc>,
    host: &'a str,
    method: &'a str,
    path: &'a str,
    query: &'a str,
    protocol: &'a str,
    headers: &'a [(String, String)],
    body: Cow<'a, str>,
    body_encoding: BodyEncoding,
    body_truncated: bool,
    remote_addr: Option<String>,
}

fn rfc3339<S: serde::Serializer>(time: &&DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Encode a body for the wire
pub fn encode_body(body: &[u8]) -> (Cow<'_, str>, BodyEncoding) {
    match std::str::from_utf8(body) {
        Ok(text) => (Cow::Borrowed(text), BodyEncoding::Utf8),
        Err(_) => (Cow::Owned(STANDARD.encode(body)), BodyEncoding::Base64),
    }
}

impl CapturedRequest {
    /// Serialize into the viewer wire format
    pub fn to_json(&self) -> serde_json::Result<String> {
        let (body, body_encoding) = encode_body(&self.body);

        serde_json::to_string(&WireCapture {
            time: &self.time,
            host: &self.host,
            method: &self.method,
            path: &self.path,
            query: &self.query,
            protocol: &self.protocol,
            headers: &self.headers,
            body,
            body_encoding,
            body_truncated: self.body_truncated,
            remote_addr: self.remote_addr.map(|addr| addr.to_string()),
        })
    }
}
