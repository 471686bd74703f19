//! Request capture
//!
//! Turns an inbound HTTP request into an immutable [`CapturedRequest`] and
//! encodes it for viewers. Nothing here holds state or can fail: an
//! oversized body is cut to the configured cap and flagged.

pub mod request;
pub mod wire;

pub use request::{CapturedRequest, RawRequest};
pub use wire::BodyEncoding;

/// Convert a raw request into a capture record
pub fn convert(raw: RawRequest, max_body_size: usize) -> CapturedRequest {
    CapturedRequest::capture(raw, max_body_size)
}
