//! Prototype persistence
//!
//! A prototype set is stored as a bincode document behind a small header
//! (magic and format version). Files are written atomically: the bytes go to
//! a temporary sibling that is renamed over the target once fully synced.
//! Several files written by one task are staged together and only renamed
//! once every one of them has been synced.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MalheurError, Result};
use crate::prototype::PrototypeSet;

/// Identifies a malheur prototype file
const MAGIC: [u8; 4] = *b"MHPS";

/// Current on-disk format version
///
/// Version 2 records the hash algorithm and normalization of the set.
pub const FORMAT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
struct StoredPrototypes {
    magic: [u8; 4],
    version: u32,
    set: PrototypeSet,
}

/// Encode `set` in the on-disk format read by [`load_prototypes`]
pub fn encode_prototypes(set: &PrototypeSet) -> Result<Vec<u8>> {
    let stored = StoredPrototypes {
        magic: MAGIC,
        version: FORMAT_VERSION,
        set: set.clone(),
    };
    bincode::serde::encode_to_vec(&stored, bincode::config::standard())
        .map_err(|e| MalheurError::Serialization(e.to_string()))
}

/// Write `set` to `path`, replacing any existing file
pub fn save_prototypes(path: impl AsRef<Path>, set: &PrototypeSet) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_prototypes(set)?;
    write_atomic(path, &bytes)?;

    tracing::info!(
        "Saved {} prototypes to {} ({} bytes)",
        set.len(),
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Read a prototype set written by [`save_prototypes`]
///
/// # Errors
///
/// Returns an input error naming `path` when the file is missing, corrupt,
/// of another format version, or structurally inconsistent.
pub fn load_prototypes(path: impl AsRef<Path>) -> Result<PrototypeSet> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| MalheurError::input(&name, e.to_string()))?;

    let (stored, _): (StoredPrototypes, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| MalheurError::input(&name, format!("corrupt prototype file: {}", e)))?;

    if stored.magic != MAGIC {
        return Err(MalheurError::input(&name, "not a prototype file"));
    }
    if stored.version != FORMAT_VERSION {
        return Err(MalheurError::input(
            &name,
            format!(
                "unsupported format version {} (expected {})",
                stored.version, FORMAT_VERSION
            ),
        ));
    }
    stored
        .set
        .validate()
        .map_err(|e| MalheurError::input(&name, e.to_string()))?;

    tracing::info!("Loaded {} prototypes from {}", stored.set.len(), name);
    Ok(stored.set)
}

/// Write `bytes` to a temporary sibling of `path`, then rename it into place
///
/// # Errors
///
/// Returns [`MalheurError::Write`] naming `path`; no temporary file is left behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    write_all_atomic(&[(path, bytes)])
}

/// Write several files so that either all of them are replaced or none is
///
/// Every file is staged and synced before the first rename. If a rename
/// fails, targets already renamed by this call are removed again.
pub fn write_all_atomic(files: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged: Vec<PathBuf> = Vec::with_capacity(files.len());
    for &(path, bytes) in files {
        let tmp_path = temp_sibling(path);
        if let Err(e) = stage(&tmp_path, bytes) {
            let _ = std::fs::remove_file(&tmp_path);
            discard(&staged);
            return Err(write_error(path, e));
        }
        staged.push(tmp_path);
    }

    for (i, (&(path, _), tmp_path)) in files.iter().zip(&staged).enumerate() {
        if let Err(e) = std::fs::rename(tmp_path, path) {
            discard(&staged[i..]);
            for &(done, _) in &files[..i] {
                let _ = std::fs::remove_file(done);
            }
            return Err(write_error(path, e));
        }
    }
    Ok(())
}

fn stage(tmp_path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut f = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp_path)?;
    f.write_all(bytes)?;
    f.sync_all()
}

fn discard(paths: &[PathBuf]) {
    for path in paths {
        let _ = std::fs::remove_file(path);
    }
}

fn write_error(path: &Path, source: std::io::Error) -> MalheurError {
    MalheurError::Write {
        path: path.display().to_string(),
        source,
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
