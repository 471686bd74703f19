//! Hostname keys for channel routing
//!
//! Every inbound request and every viewer is partitioned by the hostname it
//! targeted. Two requests reach the same channel exactly when their
//! canonical hostnames are equal.

/// Canonical hostname: lowercase, without a port suffix
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hostname(String);

impl Hostname {
    /// Canonicalize a raw `Host` header value (`Foo.Example.com:8080` -> `foo.example.com`)
    pub fn new(host: &str) -> Self {
        Self(without_port(host).to_ascii_lowercase())
    }

    /// The canonical key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Hostname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a trailing `:port` from a host value, keeping the original case
///
/// Bracketed IPv6 literals keep their brackets (`[::1]:80` -> `[::1]`).
/// A bare IPv6 address without brackets has no port to strip.
pub fn without_port(host: &str) -> &str {
    let host = host.trim();

    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}
