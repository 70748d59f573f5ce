use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::engine::CookieEngine;
use crate::cookies::psl;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use time::OffsetDateTime;
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies. Chromium uses 3300.
const MAX_COOKIES_TOTAL: usize = 3000;

/// The default cookie selection engine.
/// Modeled after Chromium's `net::CookieMonster`.
pub struct CookieMonster {
    // Store: Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
    // Domains evicted from since the last drain
    evicted: DashSet<String>,
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            evicted: DashSet::new(),
        }
    }

    /// Insert an already canonical cookie, replacing any equivalent one.
    ///
    /// A replaced cookie keeps its original creation time.
    pub fn set_canonical_cookie(&self, mut cookie: CanonicalCookie) {
        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        if let Some(pos) = entry.iter().position(|c| c.is_equivalent(&cookie)) {
            let old = entry.remove(pos);
            cookie.creation_time = old.creation_time;
        }

        // Enforce per-domain limit with LRU eviction
        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            // Remove oldest cookie (by creation_time)
            if let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            {
                entry.remove(oldest_idx);
                self.evicted.insert(cookie.domain.clone());
            } else {
                break;
            }
        }

        entry.push(cookie);
        drop(entry); // Release lock before checking global count

        // Enforce global MAX_COOKIES_TOTAL limit
        self.enforce_global_limit();
    }

    /// Remove the stored cookie equivalent to `cookie`, if any.
    fn delete_equivalent(&self, cookie: &CanonicalCookie) {
        if let Some(mut entry) = self.store.get_mut(&cookie.domain) {
            entry.retain(|c| !c.is_equivalent(cookie));
        }
    }

    /// Enforce the global cookie limit by evicting oldest cookies.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            // Find and remove the oldest cookie across all domains
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                let domain = entry.key().clone();
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let dominated = oldest
                        .as_ref()
                        .is_some_and(|(_, _, oldest_time)| cookie.creation_time < *oldest_time);
                    if oldest.is_none() || dominated {
                        oldest = Some((domain.clone(), idx, cookie.creation_time));
                    }
                }
            }

            if let Some((domain, idx, _)) = oldest {
                if let Some(mut entry) = self.store.get_mut(&domain) {
                    if idx < entry.len() {
                        entry.remove(idx);
                    }
                }
                tracing::debug!(domain = %domain, "cookie evicted by global limit");
                self.evicted.insert(domain);
            } else {
                break;
            }
        }
    }

    /// Drop cookies whose expiry has passed, and domains left empty.
    pub fn purge_expired(&self, now: OffsetDateTime) {
        self.store.retain(|_, cookies| {
            cookies.retain(|c| !c.is_expired(now));
            !cookies.is_empty()
        });
    }

    /// Get cookies matching the URL with proper domain suffix matching.
    pub fn get_cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.select(url, true)
    }

    /// Get every cookie sent to some path on the URL's origin.
    pub fn get_cookies_for_origin(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.select(url, false)
    }

    fn select(&self, url: &Url, match_path: bool) -> Vec<CanonicalCookie> {
        let mut result = Vec::new();
        let host = Self::request_host(url);
        let secure_origin = Self::is_secure_origin(url);
        let now = OffsetDateTime::now_utc();

        // Collect matching domains (host itself and parent domains)
        let domains_to_check = Self::get_matching_domains(&host);

        for domain in domains_to_check {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    // Check domain match
                    if !Self::domain_matches(&cookie.domain, &host, cookie.host_only) {
                        continue;
                    }

                    // Check path
                    if match_path && !Self::path_matches(&cookie.path, url.path()) {
                        continue;
                    }

                    // Check secure
                    if cookie.secure && !secure_origin {
                        continue;
                    }

                    // Check expiry
                    if cookie.is_expired(now) {
                        continue;
                    }

                    result.push(cookie.clone());
                }
            }
        }

        // Sort by path length (longest first) then creation time
        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// Resolve `cookie` against the URL it arrived from.
    fn canonicalize(url: &Url, mut cookie: CanonicalCookie) -> Result<CanonicalCookie, NetError> {
        let host = Self::request_host(url);
        if host.is_empty() {
            return Err(NetError::cookie_rejected(&cookie.name, "URL has no host"));
        }
        if cookie.name.is_empty() {
            return Err(NetError::cookie_rejected("", "empty cookie name"));
        }

        // Domain logic
        let domain = cookie
            .domain
            .trim_start_matches('.')
            .trim_end_matches('.')
            .to_ascii_lowercase();
        if domain.is_empty() || domain == host {
            cookie.domain = host;
            cookie.host_only = cookie.host_only || domain.is_empty();
        } else if cookie.host_only {
            return Err(NetError::cookie_rejected(
                &cookie.name,
                format!("host-only cookie for {domain} set from {host}"),
            ));
        } else if psl::is_public_suffix(&domain) {
            // Prevents supercookies (e.g., Domain=.com)
            return Err(NetError::CookiePublicSuffix);
        } else if !psl::is_valid_cookie_domain(&domain, &host) {
            return Err(NetError::cookie_rejected(
                &cookie.name,
                format!("domain {domain} does not match {host}"),
            ));
        } else {
            cookie.domain = domain;
        }

        // Path logic
        if !cookie.path.starts_with('/') {
            cookie.path = Self::default_path(url);
        }

        let secure_origin = Self::is_secure_origin(url);
        if cookie.secure && !secure_origin {
            return Err(NetError::cookie_rejected(
                &cookie.name,
                "Secure cookie set from an insecure origin",
            ));
        }
        cookie.validate_prefix(secure_origin)?;

        Ok(cookie)
    }

    /// Lowercased host without the trailing root dot.
    fn request_host(url: &Url) -> String {
        url.host_str()
            .unwrap_or("")
            .trim_end_matches('.')
            .to_ascii_lowercase()
    }

    fn is_secure_origin(url: &Url) -> bool {
        matches!(url.scheme(), "https" | "wss")
    }

    /// RFC 6265 5.1.4 default-path: the request path up to its last `/`.
    fn default_path(url: &Url) -> String {
        let path = url.path();
        match path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => path[..idx].to_string(),
        }
    }

    /// Check if cookie domain matches request host.
    /// Implements RFC 6265 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            // Host-only cookie: exact match required
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        // Domain cookie: suffix match
        let cookie_domain = cookie_domain.trim_start_matches('.');

        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // Check if request_host ends with .cookie_domain
        if request_host.len() > cookie_domain.len() {
            let boundary = request_host.len() - cookie_domain.len();
            let suffix = &request_host[boundary..];
            if suffix.eq_ignore_ascii_case(cookie_domain) {
                // Check that the character before is a dot
                return request_host.as_bytes()[boundary - 1] == b'.';
            }
        }

        false
    }

    /// Check if request path matches cookie path.
    /// Implements RFC 6265 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if request_path.starts_with(cookie_path) {
            // Cookie path is a prefix
            if cookie_path.ends_with('/') {
                return true;
            }
            // Check that the next character in request_path is '/'
            return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
        }

        false
    }

    /// Get all domains to check for a given host.
    /// Returns the host itself and all parent domains.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_string()];

        // Add parent domains (e.g., for "foo.bar.example.com", add "bar.example.com", "example.com")
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            let parent = parts[i..].join(".");
            domains.push(parent);
        }

        domains
    }

    /// Parse a `Set-Cookie` header line received from `url` and store it.
    pub fn parse_and_save_cookie(&self, url: &Url, cookie_line: &str) -> Result<(), NetError> {
        let cookie = CanonicalCookie::from_set_cookie(cookie_line, OffsetDateTime::now_utc())?;
        match self.set_cookies(url, vec![cookie]).pop() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Get total cookie count.
    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    /// Iterate over all cookies.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }
}

impl CookieEngine for CookieMonster {
    fn cookies(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.get_cookies_for_url(url)
    }

    fn origin_cookies(&self, origin: &Url) -> Vec<CanonicalCookie> {
        self.get_cookies_for_origin(origin)
    }

    fn set_cookies(&self, url: &Url, cookies: Vec<CanonicalCookie>) -> Vec<NetError> {
        let now = OffsetDateTime::now_utc();
        let mut rejected = Vec::new();

        for cookie in cookies {
            match Self::canonicalize(url, cookie) {
                // Expired on arrival: acts as a delete.
                Ok(canonical) if canonical.is_expired(now) => self.delete_equivalent(&canonical),
                Ok(canonical) => self.set_canonical_cookie(canonical),
                Err(err) => {
                    tracing::warn!(url = %url, error = %err, "cookie rejected");
                    rejected.push(err);
                }
            }
        }

        self.purge_expired(now);
        rejected
    }

    fn clear(&self) {
        self.store.clear();
        self.evicted.clear();
    }

    fn drain_evicted(&self) -> Vec<String> {
        let domains: Vec<String> = self.evicted.iter().map(|d| d.key().clone()).collect();
        for domain in &domains {
            self.evicted.remove(domain);
        }
        domains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::canonical_cookie::{CookiePriority, SameSite};

    fn make_test_cookie(name: &str, domain: &str) -> CanonicalCookie {
        CanonicalCookie {
            name: name.to_string(),
            value: "test_value".to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            creation_time: OffsetDateTime::now_utc(),
            expiration_time: Some(OffsetDateTime::now_utc() + time::Duration::days(30)),
            raw_expires: None,
            last_access_time: OffsetDateTime::now_utc(),
            secure: true,
            http_only: false,
            host_only: false,
            same_site: SameSite::Lax,
            priority: CookiePriority::Medium,
        }
    }

    #[test]
    fn test_replacement_keeps_creation_time() {
        let jar = CookieMonster::new();
        let first = make_test_cookie("session", "example.com");
        let created = first.creation_time;
        jar.set_canonical_cookie(first);

        let mut second = make_test_cookie("session", "example.com");
        second.value = "new".to_string();
        second.creation_time = created + time::Duration::seconds(5);
        jar.set_canonical_cookie(second);

        let all: Vec<_> = jar.iter_all_cookies().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "new");
        assert_eq!(all[0].creation_time, created);
    }

    #[test]
    fn test_per_domain_limit() {
        let jar = CookieMonster::new();
        for i in 0..MAX_COOKIES_PER_DOMAIN + 5 {
            jar.set_canonical_cookie(make_test_cookie(&format!("c{i}"), "example.com"));
        }
        assert_eq!(jar.total_cookie_count(), MAX_COOKIES_PER_DOMAIN);
    }

    #[test]
    fn test_set_cookies_rejects_without_aborting() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://www.example.com/").unwrap();

        let mut supercookie = CanonicalCookie::session("super", "1");
        supercookie.domain = "com".to_string();
        supercookie.host_only = false;

        let rejected = jar.set_cookies(
            &url,
            vec![
                CanonicalCookie::session("", "nameless"),
                supercookie,
                CanonicalCookie::session("ok", "1"),
            ],
        );

        assert_eq!(rejected.len(), 2);
        assert!(rejected.contains(&NetError::CookiePublicSuffix));
        let cookies = jar.cookies(&url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "ok");
        assert_eq!(cookies[0].domain, "www.example.com");
        assert!(cookies[0].host_only);
    }

    #[test]
    fn test_secure_cookie_from_insecure_origin_rejected() {
        let jar = CookieMonster::new();
        let url = Url::parse("http://example.com/").unwrap();
        let mut cookie = CanonicalCookie::session("sec", "1");
        cookie.secure = true;

        let rejected = jar.set_cookies(&url, vec![cookie]);
        assert!(matches!(rejected.as_slice(), [NetError::CookieRejected { .. }]));
        assert_eq!(jar.total_cookie_count(), 0);
    }

    #[test]
    fn test_expired_cookie_deletes() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/").unwrap();
        jar.set_cookies(&url, vec![CanonicalCookie::session("gone", "1")]);
        assert_eq!(jar.total_cookie_count(), 1);

        let mut expired = CanonicalCookie::session("gone", "");
        expired.expiration_time = Some(OffsetDateTime::now_utc() - time::Duration::hours(1));
        let rejected = jar.set_cookies(&url, vec![expired]);

        assert!(rejected.is_empty());
        assert!(jar.cookies(&url).is_empty());
    }

    #[test]
    fn test_origin_view_ignores_path() {
        let jar = CookieMonster::new();
        let url = Url::parse("https://example.com/app/login").unwrap();
        jar.parse_and_save_cookie(&url, "deep=1; Path=/app").unwrap();
        jar.parse_and_save_cookie(&url, "root=1; Path=/").unwrap();

        let origin = Url::parse("https://example.com/").unwrap();
        assert_eq!(jar.get_cookies_for_url(&origin).len(), 1);

        let names: Vec<_> = jar
            .get_cookies_for_origin(&origin)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["deep", "root"]);
    }

    #[test]
    fn test_default_path() {
        let url = Url::parse("https://example.com/a/b/page.html").unwrap();
        assert_eq!(CookieMonster::default_path(&url), "/a/b");
        let root = Url::parse("https://example.com/page").unwrap();
        assert_eq!(CookieMonster::default_path(&root), "/");
    }

    #[test]
    fn test_trailing_dot_host_is_canonical() {
        let jar = CookieMonster::new();
        let dotted = Url::parse("https://Example.COM./").unwrap();
        let plain = Url::parse("https://example.com/").unwrap();

        jar.set_cookies(&dotted, vec![CanonicalCookie::session("a", "1")]);
        assert_eq!(jar.cookies(&plain).len(), 1);
    }

    #[test]
    fn test_evictions_are_reported_once() {
        let jar = CookieMonster::new();
        for i in 0..MAX_COOKIES_PER_DOMAIN + 1 {
            jar.set_canonical_cookie(make_test_cookie(&format!("c{i}"), "example.com"));
        }

        assert_eq!(jar.drain_evicted(), ["example.com"]);
        assert!(jar.drain_evicted().is_empty());
    }

    #[test]
    fn test_clear() {
        let jar = CookieMonster::new();
        jar.set_canonical_cookie(make_test_cookie("a", "example.com"));
        jar.clear();
        assert_eq!(jar.total_cookie_count(), 0);
    }
}
