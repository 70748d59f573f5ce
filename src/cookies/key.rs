//! Canonical storage keys for snapshot entries.
//!
//! Every origin a jar has seen is filed under a key derived from its URL.
//! The key must survive a trip through disk and come back as an origin the
//! engine treats identically, so derivation and reconstruction live together
//! here.
//!
//! For `https://WWW.Example.com.:8443/x`:
//!
//! - [`KeyPolicy::SchemeAndHost`] files it under `https|www.example.com`
//! - [`KeyPolicy::HostOnly`] files it under `www.example.com`
//!
//! Both reconstruct the origin as `https://www.example.com/`.
//!
//! Ports never take part in a key: RFC 6265 cookies are not isolated by port.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use url::Url;

/// Separates scheme from host in [`KeyPolicy::SchemeAndHost`] keys.
pub const KEY_SEPARATOR: char = '|';

/// Scheme used to rebuild origins from [`KeyPolicy::HostOnly`] keys.
const HOST_ONLY_SCHEME: &str = "https";

/// How origins are bucketed in a snapshot.
///
/// A snapshot records the policy it was written with, and a jar refuses to
/// load a snapshot written under a different one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// `http` and `https` origins of the same host get separate buckets.
    #[default]
    SchemeAndHost,
    /// One bucket per host, replayed over `https`.
    HostOnly,
}

impl KeyPolicy {
    /// Derive the storage key for `url`.
    pub fn key_of(self, url: &Url) -> Result<String, NetError> {
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(NetError::InvalidUrl)?;
        let host = canonical_host(host)?;

        Ok(match self {
            KeyPolicy::SchemeAndHost => format!("{}{KEY_SEPARATOR}{host}", url.scheme()),
            KeyPolicy::HostOnly => host,
        })
    }

    /// Rebuild the origin a key was derived from.
    ///
    /// Keys this policy could not have produced are rejected rather than
    /// coerced into some other origin.
    pub fn origin_of(self, key: &str) -> Result<Url, NetError> {
        let (scheme, host) = match self {
            KeyPolicy::SchemeAndHost => key
                .split_once(KEY_SEPARATOR)
                .ok_or_else(|| NetError::key_decode(key, "missing scheme separator"))?,
            KeyPolicy::HostOnly => {
                if key.contains(KEY_SEPARATOR) {
                    return Err(NetError::key_decode(key, "unexpected scheme separator"));
                }
                (HOST_ONLY_SCHEME, key)
            }
        };

        if !is_canonical_scheme(scheme) {
            return Err(NetError::key_decode(key, "invalid scheme"));
        }
        if host.is_empty() {
            return Err(NetError::key_decode(key, "empty host"));
        }
        if host.ends_with('.') {
            return Err(NetError::key_decode(key, "host is not canonical"));
        }
        if has_port(host) {
            return Err(NetError::key_decode(key, "host carries a port"));
        }
        let forbidden = |c: char| {
            c.is_whitespace() || matches!(c, '/' | '?' | '#' | '@' | '\\' | KEY_SEPARATOR)
        };
        if host.chars().any(forbidden) {
            return Err(NetError::key_decode(key, "invalid character in host"));
        }

        let url = Url::parse(&format!("{scheme}://{host}/"))
            .map_err(|e| NetError::key_decode(key, e.to_string()))?;

        // The URL parser normalizes hosts (case, IDNA, IPv4 forms). A key that
        // changes under normalization was not produced by `key_of`.
        if url.host_str() != Some(host) {
            return Err(NetError::key_decode(key, "host is not canonical"));
        }

        Ok(url)
    }
}

/// Lowercase `host`, strip any port and the trailing root dot.
///
/// `host` is an authority host as it appears on the wire, so it may be a
/// bracketed IPv6 literal with or without a port. Brackets are kept.
pub fn canonical_host(host: &str) -> Result<String, NetError> {
    let mut host = host.to_lowercase();

    if has_port(&host) {
        let end = split_port(&host).ok_or(NetError::InvalidUrl)?;
        host.truncate(end);
    }

    if host.ends_with('.') {
        // Strip trailing dot from fully qualified domain names.
        host.pop();
    }

    if host.is_empty() {
        return Err(NetError::InvalidUrl);
    }
    Ok(host)
}

/// Reports whether `host` carries a port. `host` may be a host name, an
/// IPv4 address, or an IPv6 address (bracketed when a port follows).
pub fn has_port(host: &str) -> bool {
    match host.bytes().filter(|&b| b == b':').count() {
        0 => false,
        1 => true,
        // Bare IPv6 literals are all colons; only "[...]:port" has a port.
        _ => host.starts_with('[') && host.contains("]:"),
    }
}

/// Byte offset where the host part ends, if the port is well formed.
fn split_port(host: &str) -> Option<usize> {
    let end = if host.starts_with('[') {
        host.find("]:")? + 1
    } else {
        host.rfind(':')?
    };

    let port = &host[end + 1..];
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(end)
}

fn is_canonical_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '-' | '.')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_canonical_host() {
        assert_eq!(canonical_host("WWW.Example.COM").unwrap(), "www.example.com");
        assert_eq!(canonical_host("example.com.").unwrap(), "example.com");
        assert_eq!(canonical_host("example.com.:8080").unwrap(), "example.com");
        assert_eq!(canonical_host("127.0.0.1:80").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_canonical_host_ipv6() {
        assert_eq!(canonical_host("[::1]").unwrap(), "[::1]");
        assert_eq!(canonical_host("[::1]:8080").unwrap(), "[::1]");
        assert_eq!(canonical_host("[FE80::1]:443").unwrap(), "[fe80::1]");
        assert_eq!(canonical_host("::1").unwrap(), "::1");
    }

    #[test]
    fn test_canonical_host_rejects_bad_port() {
        assert!(canonical_host("example.com:").is_err());
        assert!(canonical_host("example.com:http").is_err());
        assert!(canonical_host(":80").is_err());
    }

    #[test]
    fn test_has_port() {
        assert!(!has_port("example.com"));
        assert!(has_port("example.com:80"));
        assert!(!has_port("[::1]"));
        assert!(has_port("[::1]:80"));
        assert!(!has_port("2001:db8::1"));
    }

    #[test]
    fn test_scheme_and_host_keys() {
        let policy = KeyPolicy::SchemeAndHost;
        assert_eq!(
            policy.key_of(&url("http://WWW.Example.com:8080/a?b")).unwrap(),
            "http|www.example.com"
        );
        assert_eq!(
            policy.key_of(&url("https://example.com./")).unwrap(),
            "https|example.com"
        );
        assert_eq!(policy.key_of(&url("https://[::1]:8443/")).unwrap(), "https|[::1]");
        assert_ne!(
            policy.key_of(&url("http://example.com/")).unwrap(),
            policy.key_of(&url("https://example.com/")).unwrap()
        );
    }

    #[test]
    fn test_host_only_keys() {
        let policy = KeyPolicy::HostOnly;
        assert_eq!(
            policy.key_of(&url("http://example.com/")).unwrap(),
            policy.key_of(&url("https://example.com:443/")).unwrap()
        );
        let origin = policy.origin_of("example.com").unwrap();
        assert_eq!(origin.as_str(), "https://example.com/");
    }

    #[test]
    fn test_key_requires_host() {
        assert_eq!(
            KeyPolicy::SchemeAndHost.key_of(&url("data:text/plain,hi")),
            Err(NetError::InvalidUrl)
        );
    }

    #[test]
    fn test_origin_of_is_left_inverse() {
        for policy in [KeyPolicy::SchemeAndHost, KeyPolicy::HostOnly] {
            for s in [
                "https://www.example.com/path",
                "http://Example.org.:81/",
                "https://[2001:db8::1]:8443/",
                "https://127.0.0.1/",
                "https://bücher.example/",
            ] {
                let key = policy.key_of(&url(s)).unwrap();
                let origin = policy.origin_of(&key).unwrap();
                assert_eq!(policy.key_of(&origin).unwrap(), key, "{policy:?} {s}");
            }
        }
    }

    #[test]
    fn test_origin_of_rejects_malformed() {
        let policy = KeyPolicy::SchemeAndHost;
        for key in [
            "example.com",
            "|example.com",
            "https|",
            "HTTPS|example.com",
            "1http|example.com",
            "https|example.com:443",
            "https|Example.com",
            "https|example.com.",
            "https|exa mple.com",
            "https|example.com/path",
            "https|a|b",
        ] {
            assert!(
                matches!(policy.origin_of(key), Err(NetError::CookieKeyDecode { .. })),
                "{key:?} should be rejected"
            );
        }

        assert!(KeyPolicy::HostOnly.origin_of("https|example.com").is_err());
    }
}
