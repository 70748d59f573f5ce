//! The serializable snapshot of a jar's per-origin cookie state.
//!
//! A [`SnapshotStore`] maps canonical keys (see [`key`](crate::cookies::key))
//! to the cookies the engine last reported for that origin. It is the only
//! thing that ever reaches disk; engine internals are never serialized.
//!
//! # Wire format
//!
//! A single JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "key_policy": "scheme_and_host",
//!   "origins": {
//!     "https|www.example.com": [ { "name": "SID", "value": "abc123", ... } ]
//!   }
//! }
//! ```
//!
//! Keys are ordered, so re-encoding a store that was decoded and left alone
//! reproduces the same bytes.

use crate::base::neterror::NetError;
use crate::cookies::canonical_cookie::CanonicalCookie;
use crate::cookies::key::KeyPolicy;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use std::io::{Read, Write};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Canonical key -> cookies last known to apply to that origin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotStore {
    entries: BTreeMap<String, Vec<CanonicalCookie>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[CanonicalCookie]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Replace the entry for `key`, returning the previous cookies.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        cookies: Vec<CanonicalCookie>,
    ) -> Option<Vec<CanonicalCookie>> {
        self.entries.insert(key.into(), cookies)
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<CanonicalCookie>> {
        self.entries.remove(key)
    }

    /// Copy every entry of `other` over this store. Entries for keys only
    /// present here are kept.
    pub fn merge_from(&mut self, other: &SnapshotStore) {
        for (key, cookies) in other {
            self.entries.insert(key.clone(), cookies.clone());
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total cookies across all entries. A cookie visible to several
    /// origins is counted once per origin.
    pub fn cookie_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<CanonicalCookie>> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a SnapshotStore {
    type Item = (&'a String, &'a Vec<CanonicalCookie>);
    type IntoIter = btree_map::Iter<'a, String, Vec<CanonicalCookie>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, Vec<CanonicalCookie>)> for SnapshotStore {
    fn from_iter<I: IntoIterator<Item = (String, Vec<CanonicalCookie>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[derive(Serialize)]
struct SnapshotDocumentRef<'a> {
    version: u32,
    key_policy: KeyPolicy,
    origins: &'a SnapshotStore,
}

#[derive(Deserialize)]
struct SnapshotDocument {
    version: u32,
    key_policy: KeyPolicy,
    origins: SnapshotStore,
}

/// Serialize `store` to `writer`, tagged with the policy its keys follow.
pub fn write_snapshot<W: Write>(
    writer: W,
    store: &SnapshotStore,
    key_policy: KeyPolicy,
) -> Result<(), NetError> {
    let document = SnapshotDocumentRef {
        version: SNAPSHOT_VERSION,
        key_policy,
        origins: store,
    };
    serde_json::to_writer(writer, &document).map_err(|e| {
        if e.is_io() {
            NetError::CookieStoreIo {
                path: "<stream>".to_string(),
                message: e.to_string(),
            }
        } else {
            NetError::serialization(e)
        }
    })
}

/// Read a complete snapshot from `reader`.
///
/// The whole document is parsed and checked before anything is returned,
/// so callers can swap it in atomically.
pub fn read_snapshot<R: Read>(reader: R, key_policy: KeyPolicy) -> Result<SnapshotStore, NetError> {
    let document: SnapshotDocument = serde_json::from_reader(reader)?;

    if document.version != SNAPSHOT_VERSION {
        return Err(NetError::deserialization(format!(
            "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
            document.version
        )));
    }
    if document.key_policy != key_policy {
        return Err(NetError::deserialization(format!(
            "snapshot keyed by {:?}, jar uses {key_policy:?}",
            document.key_policy
        )));
    }

    Ok(document.origins)
}
