//! Keeping a [`TranspositionCache`] on disk between runs

use anyhow::{Context, Result};
use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, info};

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::transposition_table::TranspositionCache;

pub const DEFAULT_CACHE_PATH: &str = "transposition_cache.bin";

/// Loads a cache file, a missing file gives an empty cache
pub fn load<P: AsRef<Path>>(path: P) -> Result<TranspositionCache> {
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no cache file found, starting empty");
            return Ok(TranspositionCache::new());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to open {}", path.display()))
        }
    };

    let cache = TranspositionCache::read_from(&mut BufReader::new(file))
        .with_context(|| format!("failed to read cache file {}", path.display()))?;
    info!(path = %path.display(), entries = cache.len(), "loaded cache");
    Ok(cache)
}

/// Merges `cache` over whatever is stored at `path` and writes the union back
///
/// Entries from `cache` replace stored entries with the same key, stored
/// entries that `cache` does not have are kept. Returns the number of entries
/// written.
///
/// Savers serialize on an exclusive lock of `<path>.lock` held from the read
/// to the write, so concurrent saves to one path all end up in the file. The
/// union is written to a temporary file next to `path` and renamed over it,
/// readers see either the old file or the new one, never a partial write.
pub fn save<P: AsRef<Path>>(path: P, cache: &TranspositionCache) -> Result<usize> {
    let path = path.as_ref();

    let lock_path = lock_path(path);
    let lock = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;
    lock.lock_exclusive()
        .with_context(|| format!("failed to lock {}", lock_path.display()))?;
    debug!(path = %lock_path.display(), "acquired cache lock");

    let mut merged = load(path)?;
    merged.merge(cache);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        merged
            .write_to(&mut writer)
            .with_context(|| format!("failed to write cache file {}", path.display()))?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;

    lock.unlock()?;
    info!(path = %path.display(), entries = merged.len(), "saved cache");
    Ok(merged.len())
}

// `cache.bin` locks through `cache.bin.lock`
fn lock_path(path: &Path) -> PathBuf {
    let mut lock_path = path.as_os_str().to_owned();
    lock_path.push(".lock");
    PathBuf::from(lock_path)
}
