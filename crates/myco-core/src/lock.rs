use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use crate::error::{MycoError, Result};

const LOCK_STALE_MS: u128 = 30_000;
const LOCK_RETRY_INTERVAL_MS: u64 = 50;
const LOCK_TIMEOUT_MS: u64 = 5_000;

pub(crate) fn lock_path(file_path: &Path) -> PathBuf {
    let mut p = file_path.as_os_str().to_owned();
    p.push(".lock");
    PathBuf::from(p)
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(|modified| {
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or(Duration::ZERO)
                .as_millis()
                > LOCK_STALE_MS
        })
        .unwrap_or(false)
}

/// Held advisory lock; removed on drop so a panicking or failing closure
/// still releases it.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: PathBuf, timeout: Duration) -> Result<Self> {
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(Self { path }),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        tracing::warn!(lock = %path.display(), "removing stale lock");
                        let _ = fs::remove_file(&path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(MycoError::LockTimeout(path.display().to_string()));
                    }
                    thread::sleep(Duration::from_millis(LOCK_RETRY_INTERVAL_MS));
                }
                Err(e) => return Err(MycoError::Io(e)),
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Run `f` while holding `<file>.lock`. Concurrent read-modify-write cycles
/// on the same data file are serialized through this.
pub fn with_file_lock<T, F>(file_path: &Path, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    with_file_lock_timeout(file_path, Duration::from_millis(LOCK_TIMEOUT_MS), f)
}

fn with_file_lock_timeout<T, F>(file_path: &Path, timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let _guard = LockGuard::acquire(lock_path(file_path), timeout)?;
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_and_release() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("grows.jsonl");
        fs::write(&file, "").unwrap();

        let result = with_file_lock(&file, || Ok(42));
        assert_eq!(result.unwrap(), 42);
        assert!(!lock_path(&file).exists());
    }

    #[test]
    fn lock_released_on_error() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("grows.jsonl");

        let result: Result<()> = with_file_lock(&file, || {
            Err(MycoError::ValidationError("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(!lock_path(&file).exists());
    }

    #[test]
    fn held_lock_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("grows.jsonl");
        fs::write(lock_path(&file), "").unwrap();

        let err = with_file_lock_timeout(&file, Duration::from_millis(120), || Ok(()))
            .unwrap_err();
        assert!(matches!(err, MycoError::LockTimeout(_)));
        // A lock we did not take is left in place.
        assert!(lock_path(&file).exists());
    }
}
