use super::DataError;
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

const LOG_TARGET: &str = "     cache";

/// Guard that releases the cache lock when dropped
#[derive(Debug)]
pub struct CacheLockGuard(File);

impl Drop for CacheLockGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.unlock() {
            log::warn!(target: LOG_TARGET, "Failed to unlock cache: {e}");
        }
    }
}

/// Take an exclusive advisory lock on `cache_dir`, waiting for other holders to finish.
pub async fn acquire_cache_lock(cache_dir: &Path) -> Result<CacheLockGuard, DataError> {
    let lock_path = cache_dir.join("cache.lock");
    let io_err = |path: &Path, source| DataError::Cache {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(cache_dir).map_err(|e| io_err(cache_dir, e))?;

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| io_err(&lock_path, e))?;

    // May block for as long as another refresh runs
    let locked = {
        let lock_path = lock_path.clone();
        tokio::task::spawn_blocking(move || {
            file.lock_exclusive()?;
            log::debug!(target: LOG_TARGET, "Acquired cache lock at '{}'", lock_path.display());
            Ok::<_, io::Error>(file)
        })
        .await
    };

    match locked {
        Ok(Ok(file)) => Ok(CacheLockGuard(file)),
        Ok(Err(e)) => Err(io_err(&lock_path, e)),
        Err(e) => Err(io_err(&lock_path, io::Error::other(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lock_can_be_reacquired_after_drop() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let guard = acquire_cache_lock(&cache_dir).await.unwrap();
        assert!(cache_dir.join("cache.lock").exists());
        drop(guard);

        let _guard = acquire_cache_lock(&cache_dir).await.unwrap();
    }
}
