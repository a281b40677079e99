//! Lock file management for single-instance enforcement.
//!
//! The daemon holds an exclusive `flock` on `autotemp.lock` in the runtime
//! directory for its whole lifetime. The file carries the holder's PID so a
//! second instance can say who is in the way.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::private_path;

/// An acquired instance lock. Released and removed on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

/// Result of trying to become the running instance.
#[derive(Debug)]
pub enum LockAttempt {
    Acquired(InstanceLock),
    /// Another process holds the lock. `pid` is `None` when the file could
    /// not be read or did not contain a PID.
    Held { pid: Option<u32> },
}

impl InstanceLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Remove first so a racing starter never reads our stale PID
        let _ = std::fs::remove_file(&self.path);
        let _ = FileExt::unlock(&self.file);
    }
}

/// Lock file location: `$XDG_RUNTIME_DIR/autotemp.lock`, or `/tmp` without one.
pub fn default_lock_path() -> PathBuf {
    let runtime_dir = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    runtime_dir.join(LOCK_FILE_NAME)
}

/// Try to take the exclusive lock at `lock_path` without blocking.
///
/// On success the file is truncated and rewritten with our PID.
pub fn acquire_lock(lock_path: &Path) -> Result<LockAttempt> {
    // Open without truncating so a live holder's PID stays readable
    let mut lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .with_context(|| format!("Failed to open lock file {}", private_path(lock_path)))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Ok(LockAttempt::Held {
            pid: read_lock_pid(lock_path),
        });
    }

    lock_file.set_len(0)?;
    lock_file.seek(SeekFrom::Start(0))?;
    writeln!(&lock_file, "{}", std::process::id())?;
    lock_file.flush()?;

    Ok(LockAttempt::Acquired(InstanceLock {
        file: lock_file,
        path: lock_path.to_path_buf(),
    }))
}

/// PID recorded in a lock file, if it holds one.
pub fn read_lock_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path)
        .ok()?
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}
