//! Cookie persistence - save and load jars to/from disk.
//!
//! Files hold the JSON snapshot document described in
//! [`snapshot`](crate::cookies::snapshot). Saving goes through a sibling
//! temporary file and a rename, so a crash mid-write leaves the previous
//! file intact.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::cookies::engine::CookieEngine;
use crate::cookies::jar::PersistentJar;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Save a jar's snapshot to a file.
///
/// # Example
/// ```ignore
/// persistence::save_cookies(&jar, Path::new("/path/to/cookies.json"))?;
/// ```
pub fn save_cookies<E: CookieEngine>(jar: &PersistentJar<E>, path: &Path) -> Result<(), NetError> {
    let tmp = temp_path(path);

    let result = write_temp(jar, &tmp).and_then(|()| fs::rename(&tmp, path).store_context(path));
    if let Err(err) = result {
        // Best effort.
        let _ = fs::remove_file(&tmp);
        tracing::warn!(path = %path.display(), error = %err, "cookie jar save failed");
        return Err(err);
    }

    tracing::debug!(path = %path.display(), "cookie jar saved");
    Ok(())
}

fn write_temp<E: CookieEngine>(jar: &PersistentJar<E>, tmp: &Path) -> Result<(), NetError> {
    let file = File::create(tmp).store_context(tmp)?;
    let mut writer = BufWriter::new(file);
    jar.encode(&mut writer)?;
    writer.flush().store_context(tmp)?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .and_then(|file| file.sync_all())
        .store_context(tmp)
}

/// Load a file into a new jar backed by the default engine.
///
/// # Example
/// ```ignore
/// let jar = persistence::load_cookies(Path::new("/path/to/cookies.json"))?;
/// ```
pub fn load_cookies(path: &Path) -> Result<PersistentJar, NetError> {
    let mut jar = PersistentJar::new();
    load_into(&mut jar, path)?;
    Ok(jar)
}

/// Replace `jar`'s contents with the snapshot stored at `path`.
///
/// Same semantics as [`PersistentJar::decode`]: a missing or corrupt file
/// leaves the jar unchanged.
pub fn load_into<E: CookieEngine>(jar: &mut PersistentJar<E>, path: &Path) -> Result<(), NetError> {
    let file = File::open(path).store_context(path)?;
    jar.decode(BufReader::new(file))?;
    tracing::debug!(path = %path.display(), "cookie jar loaded");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
