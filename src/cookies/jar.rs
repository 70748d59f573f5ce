//! A cookie jar whose contents survive the process.
//!
//! [`PersistentJar`] pairs a live [`CookieEngine`] with a [`SnapshotStore`].
//! The engine answers "which cookies go on this request"; the snapshot is a
//! derived copy of the engine's per-origin view that can be encoded, written
//! out, and replayed into a fresh engine later.
//!
//! ```rust
//! use cookiestash::cookies::canonical_cookie::CanonicalCookie;
//! use cookiestash::cookies::jar::PersistentJar;
//! use url::Url;
//!
//! let url = Url::parse("http://www.example.com/").unwrap();
//! let mut jar = PersistentJar::new();
//! jar.set_cookies(&url, vec![CanonicalCookie::session("SID", "abc123")])?;
//!
//! let bytes = jar.to_vec()?;
//! let mut restored = PersistentJar::new();
//! restored.decode_slice(&bytes)?;
//! assert_eq!(restored.cookies(&url)[0].value, "abc123");
//! # Ok::<(), cookiestash::base::neterror::NetError>(())
//! ```
//!
//! A jar is single-owner. Wrap the whole jar in a lock if it must be shared:
//! [`set_cookies`](PersistentJar::set_cookies) reads the engine and writes the
//! snapshot in two steps.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::engine::CookieEngine;
use crate::cookies::key::KeyPolicy;
use crate::cookies::monster::CookieMonster;
use crate::cookies::psl;
use crate::cookies::snapshot::{self, SnapshotStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::Url;

/// Jar configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarConfig {
    /// How origins map to snapshot keys. Fixed for the jar's lifetime.
    pub key_policy: KeyPolicy,
}

/// A cookie jar with a serializable, origin-indexed snapshot.
pub struct PersistentJar<E: CookieEngine = CookieMonster> {
    engine: E,
    store: SnapshotStore,
    config: JarConfig,
}

impl PersistentJar<CookieMonster> {
    /// An empty jar backed by [`CookieMonster`].
    pub fn new() -> Self {
        Self::with_engine(CookieMonster::new())
    }
}

impl Default for PersistentJar<CookieMonster> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CookieEngine> PersistentJar<E> {
    pub fn with_engine(engine: E) -> Self {
        Self::with_config(engine, JarConfig::default())
    }

    pub fn with_config(engine: E, config: JarConfig) -> Self {
        Self {
            engine,
            store: SnapshotStore::new(),
            config,
        }
    }

    pub fn config(&self) -> JarConfig {
        self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Direct access to the snapshot, e.g. to copy entries in from another
    /// jar. Call [`refresh`](Self::refresh) afterwards so the engine agrees.
    pub fn store_mut(&mut self) -> &mut SnapshotStore {
        &mut self.store
    }

    /// Cookies to send on a request to `url`.
    pub fn cookies(&self, url: &Url) -> Vec<CanonicalCookie> {
        self.engine.cookies(url)
    }

    /// Value for the `Cookie` request header, if any cookie applies.
    ///
    /// Cookies are joined in engine order as `name=value; name2=value2`.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.cookies(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Store cookies received from `url` and refresh the snapshot entry for
    /// its origin from the engine.
    ///
    /// The entry is written even when the engine ends up holding nothing for
    /// the origin. Other entries under the same registrable domain are
    /// refreshed as well, since domain cookies and `http`/`https` pairs share
    /// engine state and would otherwise go stale. So are entries of any site
    /// the engine reports evicting from. Rejected cookies are
    /// reported together as [`NetError::CookiesRejected`]; the accepted ones
    /// are stored regardless.
    pub fn set_cookies(&mut self, url: &Url, cookies: Vec<CanonicalCookie>) -> Result<(), NetError> {
        let key = self.config.key_policy.key_of(url)?;
        // Record the view of the origin the key replays to, which for
        // host-only keys is the https origin regardless of `url`'s scheme.
        let origin = self.config.key_policy.origin_of(&key)?;
        let rejected = self.engine.set_cookies(url, cookies);

        let view = self.engine.origin_cookies(&origin);
        tracing::debug!(key = %key, count = view.len(), "snapshot entry updated");
        self.store.insert(key.clone(), view);

        let mut sites = vec![psl::cookie_site(url.host_str().unwrap_or(""))];
        for domain in self.engine.drain_evicted() {
            let site = psl::cookie_site(&domain);
            if !sites.contains(&site) {
                sites.push(site);
            }
        }
        self.resync_sites(&sites, &key);

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(NetError::CookiesRejected(rejected))
        }
    }

    /// Refresh every entry, other than `skip`, whose origin is in one of
    /// `sites`.
    fn resync_sites(&mut self, sites: &[String], skip: &str) {
        let policy = self.config.key_policy;

        let siblings: Vec<(String, Url)> = self
            .store
            .keys()
            .filter(|key| *key != skip)
            .filter_map(|key| Some((key.to_string(), policy.origin_of(key).ok()?)))
            .filter(|(_, origin)| {
                sites.contains(&psl::cookie_site(origin.host_str().unwrap_or("")))
            })
            .collect();

        for (key, origin) in siblings {
            let view = self.engine.origin_cookies(&origin);
            self.store.insert(key, view);
        }
    }

    /// Parse `Set-Cookie` header values from a response for `url` and store
    /// the cookies in one batch.
    ///
    /// Unparseable lines are reported alongside engine rejections.
    pub fn set_cookie_headers<'a, I>(&mut self, url: &Url, lines: I) -> Result<(), NetError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let now = OffsetDateTime::now_utc();
        let mut rejected = Vec::new();
        let mut cookies = Vec::new();

        for line in lines {
            match CanonicalCookie::from_set_cookie(line, now) {
                Ok(cookie) => cookies.push(cookie),
                Err(err) => rejected.push(err),
            }
        }

        if let Err(err) = self.set_cookies(url, cookies) {
            rejected.extend(err.failures().iter().cloned());
        }

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(NetError::CookiesRejected(rejected))
        }
    }

    /// Replay every snapshot entry into the engine.
    ///
    /// Each key is turned back into an origin and its cookies are set through
    /// the engine. The snapshot itself is not modified, so a decoded store
    /// re-encodes to the same bytes. A malformed key is reported and left in
    /// place; it does not stop the remaining keys from being replayed.
    pub fn refresh(&mut self) -> Result<(), NetError> {
        let policy = self.config.key_policy;
        let mut failures = Vec::new();

        for (key, cookies) in &self.store {
            match policy.origin_of(key) {
                Ok(origin) => {
                    failures.extend(self.engine.set_cookies(&origin, cookies.clone()));
                }
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "skipping malformed snapshot key");
                    failures.push(err);
                }
            }
        }

        tracing::debug!(
            entries = self.store.len(),
            failures = failures.len(),
            "snapshot replayed"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NetError::ReplayIncomplete(failures))
        }
    }

    /// Copy `other`'s entries over this jar's snapshot and replay.
    pub fn merge_store(&mut self, other: &SnapshotStore) -> Result<(), NetError> {
        self.store.merge_from(other);
        self.refresh()
    }

    /// Serialize the snapshot to `writer`.
    pub fn encode<W: Write>(&self, writer: W) -> Result<(), NetError> {
        snapshot::write_snapshot(writer, &self.store, self.config.key_policy)?;
        tracing::debug!(entries = self.store.len(), "cookie snapshot encoded");
        Ok(())
    }

    /// Replace the jar's contents with a snapshot read from `reader`.
    ///
    /// The stream is fully parsed first; if that fails the jar is left as it
    /// was. Otherwise the engine is cleared, the snapshot swapped in, and
    /// [`refresh`](Self::refresh) run. Replay failures are returned, but the
    /// decoded snapshot stays installed.
    pub fn decode<R: Read>(&mut self, reader: R) -> Result<(), NetError> {
        let store = match snapshot::read_snapshot(reader, self.config.key_policy) {
            Ok(store) => store,
            Err(err) => {
                tracing::error!(error = %err, "cookie snapshot decode failed");
                return Err(err);
            }
        };

        tracing::debug!(entries = store.len(), "cookie snapshot decoded");
        self.engine.clear();
        self.store = store;
        self.refresh()
    }

    /// Encode the snapshot into a byte vector.
    pub fn to_vec(&self) -> Result<Vec<u8>, NetError> {
        let mut buf = Vec::new();
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode a snapshot held in memory. See [`decode`](Self::decode).
    pub fn decode_slice(&mut self, bytes: &[u8]) -> Result<(), NetError> {
        self.decode(bytes)
    }
}

/// Debug dump of the live engine, one block per snapshot origin.
///
/// Cookies come from the engine, not the snapshot, so this shows what would
/// actually be sent.
impl<E: CookieEngine> fmt::Display for PersistentJar<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let policy = self.config.key_policy;

        for key in self.store.keys() {
            let origin = match policy.origin_of(key) {
                Ok(origin) => origin,
                Err(err) => {
                    writeln!(f, "{key}: {err}")?;
                    continue;
                }
            };

            let cookies = self.engine.origin_cookies(&origin);
            writeln!(f, "{} ({} cookies)", origin.origin().ascii_serialization(), cookies.len())?;

            for (i, cookie) in cookies.iter().enumerate() {
                let expires = match cookie.expiration_time {
                    Some(t) => t.format(&Rfc3339).unwrap_or_else(|_| t.to_string()),
                    None => "session".to_string(),
                };
                writeln!(f, "  [{i}] {}={}", cookie.name, cookie.value)?;
                writeln!(f, "      domain={} path={}", cookie.domain, cookie.path)?;
                writeln!(
                    f,
                    "      expires={} raw_expires={}",
                    expires,
                    cookie.raw_expires.as_deref().unwrap_or("-")
                )?;
                writeln!(
                    f,
                    "      secure={} http_only={} host_only={}",
                    cookie.secure, cookie.http_only, cookie.host_only
                )?;
            }
        }

        Ok(())
    }
}
