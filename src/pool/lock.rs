use crate::error::{DgaError, Result};
use chrono::Utc;
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Holder information written into the lock file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockHolder {
    pid: u32,
    acquired_at: String,
}

/// Named cross-process mutex: an exclusive advisory lock on a file in the
/// run directory.
///
/// The OS drops the lock when the holding descriptor closes, so a holder
/// killed mid-section does not wedge the run. The file itself is never
/// removed; unlinking a locked file would let a later opener lock a fresh
/// inode while a waiter still holds the old one.
#[derive(Debug, Clone)]
pub struct PoolLock {
    path: PathBuf,
    timeout: Duration,
    poll: Duration,
}

/// Held lock; released when the guard drops or the process exits.
#[derive(Debug)]
pub struct PoolLockGuard {
    file: File,
    path: PathBuf,
}

impl PoolLock {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration, poll: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
            poll,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Polls until the lock is taken or the timeout elapses.
    pub fn acquire(&self) -> Result<PoolLockGuard> {
        let started = Instant::now();
        loop {
            if let Some(guard) = self.try_acquire()? {
                log::trace!("Acquired pool lock after {:?}", started.elapsed());
                return Ok(guard);
            }
            if started.elapsed() >= self.timeout {
                return Err(DgaError::LockTimeout {
                    path: self.path.display().to_string(),
                    waited_secs: started.elapsed().as_secs(),
                    holder: self.describe_holder(),
                });
            }
            std::thread::sleep(self.poll);
        }
    }

    /// Single attempt; `Ok(None)` if another holder has the lock.
    pub fn try_acquire(&self) -> Result<Option<PoolLockGuard>> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        if !file.try_lock_exclusive()? {
            return Ok(None);
        }

        let holder = LockHolder {
            pid: std::process::id(),
            acquired_at: Utc::now().to_rfc3339(),
        };
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(serde_json::to_string(&holder)?.as_bytes())?;
        Ok(Some(PoolLockGuard {
            file,
            path: self.path.clone(),
        }))
    }

    fn describe_holder(&self) -> String {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| serde_json::from_str::<LockHolder>(&s).ok())
            .map(|h| format!("pid {} since {}", h.pid, h.acquired_at))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

impl Drop for PoolLockGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock.
        if let Err(e) = self.file.set_len(0) {
            log::warn!("Failed to clear pool lock holder {}: {}", self.path.display(), e);
        }
    }
}
