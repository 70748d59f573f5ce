//! # cookiestash
//!
//! A persistable HTTP cookie jar for Rust.
//!
//! `cookiestash` keeps an in-memory cookie selection engine and a
//! serializable, origin-indexed snapshot of it in step, so the cookies one
//! process collects can be written out and restored into another with the
//! same selection behavior.
//!
//! ## Features
//!
//! - **Cookie Selection**: RFC 6265 domain, path, secure and expiry matching with PSL validation
//! - **Snapshots**: Versioned JSON documents keyed by canonical origin
//! - **Replay**: Restore a snapshot into a fresh engine, reporting bad keys without losing the rest
//! - **Pluggable Engines**: Any [`CookieEngine`](cookies::CookieEngine) can back a jar
//!
//! ## Quick Start
//!
//! ```rust
//! use cookiestash::cookies::{CanonicalCookie, PersistentJar};
//! use url::Url;
//!
//! let url = Url::parse("http://www.example.com/").unwrap();
//! let mut jar = PersistentJar::new();
//! jar.set_cookies(
//!     &url,
//!     vec![
//!         CanonicalCookie::session("SID", "abc123"),
//!         CanonicalCookie::session("PREF", "x"),
//!     ],
//! )?;
//!
//! let mut buf = Vec::new();
//! jar.encode(&mut buf)?;
//!
//! let mut jar2 = PersistentJar::new();
//! jar2.decode(buf.as_slice())?;
//! assert_eq!(jar2.cookie_header(&url).as_deref(), Some("SID=abc123; PREF=x"));
//! # Ok::<(), cookiestash::base::neterror::NetError>(())
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and I/O context helpers
//! - [`cookies`] - Cookie engine, canonical keys, snapshots, and the persistent jar

pub mod base;
pub mod cookies;
