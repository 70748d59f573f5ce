use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// Timestamps serialize as RFC 3339 so persisted snapshots stay readable
/// and survive a decode/encode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub creation_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub expiration_time: Option<OffsetDateTime>,
    /// The `Expires` attribute exactly as the server sent it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_expires: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub last_access_time: OffsetDateTime,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    pub priority: CookiePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    Unspecified,
    NoRestriction,
    Lax,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookiePriority {
    Low,
    Medium,
    High,
}

impl CanonicalCookie {
    pub fn new(
        name: String,
        value: String,
        domain: String,
        path: String,
        creation_time: OffsetDateTime,
        expiration_time: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            name,
            value,
            domain,
            path,
            creation_time,
            expiration_time,
            raw_expires: None,
            last_access_time: creation_time,
            secure: false,
            http_only: false,
            host_only: true, // Default to host-only if not specified
            same_site: SameSite::Unspecified,
            priority: CookiePriority::Medium,
        }
    }

    /// A host-only session cookie with an empty domain and path.
    ///
    /// The engine fills in the request host and the default path `/` when
    /// the cookie is set, the same way it treats a bare `name=value` header.
    pub fn session(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name.into(),
            value.into(),
            String::new(),
            String::new(),
            OffsetDateTime::now_utc(),
            None,
        )
    }

    /// Parse a `Set-Cookie` header value.
    ///
    /// Domain and path are left empty when the header omits them; the engine
    /// resolves them against the response URL.
    pub fn from_set_cookie(line: &str, now: OffsetDateTime) -> Result<Self, NetError> {
        let parsed = cookie::Cookie::parse(line).map_err(|e| {
            let name = line.split(['=', ';']).next().unwrap_or("").trim();
            NetError::cookie_rejected(name, e.to_string())
        })?;

        // An explicit Domain makes this a domain cookie. The cookie crate
        // already strips the leading dot.
        let (domain, host_only) = match parsed.domain() {
            Some(d) if !d.is_empty() => (d.to_ascii_lowercase(), false),
            _ => (String::new(), true),
        };

        let path = parsed
            .path()
            .filter(|p| p.starts_with('/'))
            .unwrap_or_default()
            .to_string();

        // Max-Age wins over Expires (RFC 6265 5.3 step 3).
        let expiration_time = match parsed.max_age() {
            Some(max_age) if max_age.is_positive() => Some(capped_expiry(now, max_age)),
            Some(_) => Some(OffsetDateTime::UNIX_EPOCH),
            None => parsed
                .expires_datetime()
                .map(|expires| expires.min(capped_expiry(now, MAX_COOKIE_AGE))),
        };

        let same_site = match parsed.same_site() {
            Some(cookie::SameSite::Lax) => SameSite::Lax,
            Some(cookie::SameSite::Strict) => SameSite::Strict,
            Some(cookie::SameSite::None) => SameSite::NoRestriction,
            None => SameSite::Unspecified,
        };

        Ok(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            raw_expires: raw_attribute(line, "expires"),
            last_access_time: now,
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            same_site,
            priority: CookiePriority::Medium,
        })
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        if let Some(expiry) = self.expiration_time {
            expiry < current_time
        } else {
            false // Session cookie
        }
    }

    /// Returns true when this cookie and `other` occupy the same slot in a jar.
    pub fn is_equivalent(&self, other: &CanonicalCookie) -> bool {
        self.name == other.name
            && self.path == other.path
            && self.domain.eq_ignore_ascii_case(&other.domain)
    }

    /// Validate __Secure- and __Host- cookie prefixes per RFC 6265bis.
    /// - __Secure- cookies MUST have the Secure attribute
    /// - __Host- cookies MUST have Secure, Path="/", and no Domain attribute
    pub fn validate_prefix(&self, secure_origin: bool) -> Result<(), NetError> {
        if self.name.starts_with("__Secure-") && (!self.secure || !secure_origin) {
            return Err(NetError::CookieInvalidPrefix);
        }

        if self.name.starts_with("__Host-") {
            // __Host- requires: Secure flag, Path="/", host-only (no Domain), secure origin
            if !self.secure || self.path != "/" || !self.host_only || !secure_origin {
                return Err(NetError::CookieInvalidPrefix);
            }
        }

        Ok(())
    }
}

/// Upper bound on cookie lifetime (RFC 6265bis 5.5, 400 days).
const MAX_COOKIE_AGE: Duration = Duration::days(400);

/// `now + age`, with `age` capped at [`MAX_COOKIE_AGE`]. Saturates at the
/// largest representable time instead of overflowing.
fn capped_expiry(now: OffsetDateTime, age: Duration) -> OffsetDateTime {
    now.checked_add(age.min(MAX_COOKIE_AGE))
        .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

/// The unparsed value of the first `name=...` attribute in a Set-Cookie line.
fn raw_attribute(line: &str, name: &str) -> Option<String> {
    line.split(';').skip(1).find_map(|attr| {
        let (key, value) = attr.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}
