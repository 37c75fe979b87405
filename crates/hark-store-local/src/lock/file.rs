use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fs2::FileExt;
use hark_core::{HarkError, HeldLock, LockGuard, LockManager};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

/// Retries after the first failed attempt on the file lock.
pub const DEFAULT_LOCK_RETRIES: u32 = 5;

/// Fixed delay between file lock attempts.
pub const DEFAULT_LOCK_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Two-level lock: a mutex for tasks inside this process and an OS-level
/// exclusive file lock for other processes.
///
/// - The mutex is taken first; tasks in this process queue on it without a
///   deadline
/// - The file lock is taken next, with a bounded number of retries, so only
///   other processes can spend the retry budget
/// - Release goes the other way: file lock first, then the mutex
/// - Process crash releases the file lock (OS closes file descriptors)
#[derive(Debug)]
pub struct FileLock {
    path: PathBuf,
    mutex: Arc<Mutex<()>>,
    max_retries: u32,
    retry_delay: Duration,
}

impl FileLock {
    /// Create a new FileLock on the given lock file path.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            mutex: Arc::new(Mutex::new(())),
            max_retries: DEFAULT_LOCK_RETRIES,
            retry_delay: DEFAULT_LOCK_RETRY_DELAY,
        }
    }

    /// Override the retry budget (default 5 retries, 50ms apart).
    pub fn with_retry_policy(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_lock_file(&self) -> Result<File, HarkError> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| {
                HarkError::state_lock(format!(
                    "failed to open lock file {}: {}",
                    self.path.display(),
                    e
                ))
            })
    }
}

#[async_trait]
impl LockManager for FileLock {
    #[instrument(skip(self), level = "debug")]
    async fn acquire(&self) -> Result<LockGuard, HarkError> {
        let guard = Arc::clone(&self.mutex).lock_owned().await;
        let file = self.open_lock_file()?;

        let mut attempt = 0;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock || is_contended(&e) => {
                    if attempt >= self.max_retries {
                        debug!("Giving up on lock after {} attempts", attempt + 1);
                        return Err(HarkError::state_lock(format!(
                            "{} is held by another writer",
                            self.path.display()
                        )));
                    }
                    debug!("Lock contended (attempt {}), retrying", attempt + 1);
                }
                Err(e) => return Err(HarkError::state_lock(e)),
            }

            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }

        debug!("Acquired state lock on {}", self.path.display());
        Ok(LockGuard::new(HeldFileLock { file, guard }))
    }
}

/// `fs2` reports contention with a platform-specific error on some targets.
fn is_contended(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

struct HeldFileLock {
    file: File,
    guard: OwnedMutexGuard<()>,
}

impl HeldLock for HeldFileLock {
    fn release(self: Box<Self>) -> Result<(), HarkError> {
        let HeldFileLock { file, guard } = *self;

        // Innermost level first; the mutex is given back even if unlock fails
        let result = FileExt::unlock(&file)
            .map_err(|e| HarkError::internal(format!("failed to unlock state: {}", e)));
        drop(file);
        drop(guard);
        debug!("Released state lock");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tempfile::TempDir;

    fn setup() -> (FileLock, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let lock = FileLock::new(temp_dir.path().join("state.json.lock"));
        (lock, temp_dir)
    }

    #[tokio::test]
    async fn test_acquire_release() {
        let (lock_mgr, _temp) = setup();

        let guard = lock_mgr.acquire().await.unwrap();
        assert!(lock_mgr.path().exists());
        guard.release().unwrap();

        // Can take it again once released
        let guard = lock_mgr.acquire().await.unwrap();
        guard.release().unwrap();
    }

    #[tokio::test]
    async fn test_drop_releases() {
        let (lock_mgr, _temp) = setup();

        {
            let _guard = lock_mgr.acquire().await.unwrap();
        }

        let other = File::open(lock_mgr.path()).unwrap();
        FileExt::try_lock_exclusive(&other).unwrap();
        FileExt::unlock(&other).unwrap();
    }

    #[tokio::test]
    async fn test_times_out_when_held_elsewhere() {
        let (lock_mgr, _temp) = setup();
        let lock_mgr = lock_mgr.with_retry_policy(3, Duration::from_millis(10));

        // Stand-in for another process holding the lock file
        let foreign = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_mgr.path())
            .unwrap();
        FileExt::try_lock_exclusive(&foreign).unwrap();

        let started = Instant::now();
        let err = lock_mgr.acquire().await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert_eq!(err.code(), Some(500003));

        FileExt::unlock(&foreign).unwrap();
        let guard = lock_mgr.acquire().await.unwrap();
        guard.release().unwrap();
    }

    #[tokio::test]
    async fn test_default_ceiling() {
        let (lock_mgr, _temp) = setup();
        // A second FileLock on the same path acts as another process
        let other_process = FileLock::new(lock_mgr.path());
        let held = other_process.acquire().await.unwrap();

        let started = Instant::now();
        assert!(lock_mgr.acquire().await.is_err());
        let elapsed = started.elapsed();
        assert!(elapsed >= DEFAULT_LOCK_RETRY_DELAY * DEFAULT_LOCK_RETRIES);

        held.release().unwrap();
    }

    #[tokio::test]
    async fn test_same_process_waiter_outlasts_retry_budget() {
        let (lock_mgr, _temp) = setup();
        let lock_mgr = Arc::new(lock_mgr.with_retry_policy(1, Duration::from_millis(1)));
        let held = lock_mgr.acquire().await.unwrap();

        let waiter = {
            let lock_mgr = Arc::clone(&lock_mgr);
            tokio::spawn(async move { lock_mgr.acquire().await.map(|g| g.release()) })
        };

        // Far longer than the file lock retry budget
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        held.release().unwrap();
        waiter.await.unwrap().unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_locking() {
        use tokio::sync::Barrier;

        let (lock_mgr, _temp) = setup();
        let lock_mgr = Arc::new(lock_mgr);

        const NUM_TASKS: usize = 10;
        let barrier = Arc::new(Barrier::new(NUM_TASKS));
        let inside = Arc::new(AtomicUsize::new(0));
        let counter = Arc::new(AtomicUsize::new(0));
        let mut handles = vec![];

        for _ in 0..NUM_TASKS {
            let lock_mgr = Arc::clone(&lock_mgr);
            let barrier = Arc::clone(&barrier);
            let inside = Arc::clone(&inside);
            let counter = Arc::clone(&counter);

            handles.push(tokio::spawn(async move {
                barrier.wait().await;

                let guard = lock_mgr.acquire().await.expect("acquire failed");

                // Critical section: nobody else may be in here
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::time::sleep(Duration::from_millis(1)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                inside.fetch_sub(1, Ordering::SeqCst);

                guard.release().expect("release failed");
            }));
        }

        for handle in handles {
            handle.await.expect("task panicked");
        }

        assert_eq!(counter.load(Ordering::SeqCst), NUM_TASKS);
    }
}
