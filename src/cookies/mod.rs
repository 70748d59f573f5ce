//! Cookie storage with durable snapshots.
//!
//! This module provides a persistable cookie jar:
//!
//! - **Selection**: The [`CookieEngine`](engine::CookieEngine) trait and the default
//!   in-memory engine ([`CookieMonster`](monster::CookieMonster))
//! - **Keys**: Origin to storage key mapping ([`key`])
//! - **Snapshots**: The serializable per-origin view ([`SnapshotStore`](snapshot::SnapshotStore))
//! - **Jar**: Engine and snapshot kept in sync ([`PersistentJar`](jar::PersistentJar))
//! - **Persistence**: Save/load jars to disk ([`persistence`])
//!
//! # Architecture
//!
//! | Chromium (C++) | cookiestash (Rust) | Responsibility |
//! |----------------|--------------------|----------------|
//! | `net::CookieMonster` | [`CookieMonster`](monster::CookieMonster) | Cookie selection with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`](canonical_cookie::CanonicalCookie) | Single cookie representation |
//! | `net::CookieStore` | [`CookieEngine`](engine::CookieEngine) | Engine interface |
//! | `SqlitePersistentCookieStore` | [`PersistentJar`](jar::PersistentJar) + [`persistence`] | Disk persistence |
//!
//! # Save and Restore
//!
//! ```rust,no_run
//! use cookiestash::cookies::jar::PersistentJar;
//! use cookiestash::cookies::persistence;
//! use std::path::Path;
//! use url::Url;
//!
//! let url = Url::parse("https://example.com/")?;
//! let mut jar = PersistentJar::new();
//! jar.set_cookie_headers(&url, ["session=abc123; Secure; HttpOnly"])?;
//! persistence::save_cookies(&jar, Path::new("cookies.json"))?;
//!
//! let restored = persistence::load_cookies(Path::new("cookies.json"))?;
//! assert_eq!(restored.cookie_header(&url).as_deref(), Some("session=abc123"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Chromium References
//!
//! - Cookie monster: `net/cookies/cookie_monster.cc`
//! - Persistent store: `net/extras/sqlite/sqlite_persistent_cookie_store.cc`

pub mod canonical_cookie;
pub mod engine;
pub mod jar;
pub mod key;
pub mod monster;
pub mod persistence;
pub mod psl;
pub mod snapshot;

pub use canonical_cookie::CanonicalCookie;
pub use engine::CookieEngine;
pub use jar::{JarConfig, PersistentJar};
pub use key::KeyPolicy;
pub use monster::CookieMonster;
pub use snapshot::SnapshotStore;
