//! Public Suffix List (PSL) checks for cookie domains.
//!
//! Keeps [`CookieMonster`](crate::cookies::monster::CookieMonster) from
//! accepting supercookies scoped to `.com`, `.co.uk`, `github.io` and the
//! like. Backed by Mozilla's list via the `psl` crate.

use psl::{List, Psl};
use std::net::IpAddr;

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_ascii_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        // Unknown TLD
        None => false,
    }
}

/// Get the registrable domain (eTLD+1) for a domain.
/// For "sub.example.com", returns "example.com".
/// For "com" (public suffix), returns None.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain_lower = domain.to_ascii_lowercase();
    psl::domain(domain_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// The widest scope a cookie set by `host` can reach: its registrable
/// domain, or the host itself for IP literals and public suffixes.
pub fn cookie_site(host: &str) -> String {
    if is_ip_literal(host) {
        return host.to_ascii_lowercase();
    }
    registrable_domain(host).unwrap_or_else(|| host.to_ascii_lowercase())
}

/// True for IPv4 literals and IPv6 literals, bracketed or not.
pub fn is_ip_literal(host: &str) -> bool {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<IpAddr>().is_ok()
}

/// Check if a cookie domain is valid for a given request host.
///
/// The host must equal the cookie domain or be a subdomain of it, and the
/// cookie domain must not be a public suffix. IP hosts only accept a domain
/// identical to themselves.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain
        .strip_prefix('.')
        .unwrap_or(cookie_domain)
        .to_ascii_lowercase();
    let url_host = url_host.to_ascii_lowercase();

    if url_host == cookie_domain {
        return true;
    }
    if is_ip_literal(&url_host) || is_public_suffix(&cookie_domain) {
        return false;
    }

    url_host
        .strip_suffix(cookie_domain.as_str())
        .is_some_and(|prefix| prefix.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_public_suffix() {
        assert!(is_public_suffix("com"));
        assert!(is_public_suffix("COM"));
        assert!(is_public_suffix("co.uk"));
        assert!(is_public_suffix("github.io"));
    }

    #[test]
    fn test_not_public_suffix() {
        assert!(!is_public_suffix("example.com"));
        assert!(!is_public_suffix("sub.example.co.uk"));
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("deep.sub.example.com").as_deref(), Some("example.com"));
        assert_eq!(registrable_domain("sub.example.co.uk").as_deref(), Some("example.co.uk"));
        assert_eq!(registrable_domain("co.uk"), None);
    }

    #[test]
    fn test_cookie_site() {
        assert_eq!(cookie_site("a.example.com"), cookie_site("b.example.com"));
        assert_ne!(cookie_site("a.example.com"), cookie_site("a.example.org"));
        assert_eq!(cookie_site("[::1]"), "[::1]");
        assert_ne!(cookie_site("127.0.0.1"), cookie_site("10.0.0.1"));
    }

    #[test]
    fn test_ip_literals() {
        assert!(is_ip_literal("127.0.0.1"));
        assert!(is_ip_literal("[::1]"));
        assert!(is_ip_literal("::1"));
        assert!(!is_ip_literal("example.com"));
        assert!(!is_ip_literal("[example.com]"));
    }

    #[test]
    fn test_valid_cookie_domain() {
        assert!(is_valid_cookie_domain("example.com", "example.com"));
        assert!(is_valid_cookie_domain("example.com", "sub.example.com"));
        assert!(is_valid_cookie_domain(".Example.com", "sub.example.com"));
        assert!(is_valid_cookie_domain("127.0.0.1", "127.0.0.1"));
    }

    #[test]
    fn test_invalid_cookie_domain() {
        assert!(!is_valid_cookie_domain("com", "example.com"));
        assert!(!is_valid_cookie_domain("co.uk", "example.co.uk"));
        assert!(!is_valid_cookie_domain("other.com", "example.com"));
        assert!(!is_valid_cookie_domain("ample.com", "example.com"));
        assert!(!is_valid_cookie_domain("0.0.1", "127.0.0.1"));
    }
}
