use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Name of the lock file inside the log folder
const LOCK_FILE: &str = ".lock";

/// Advisory lock held around one read-modify-write of a daily log.
///
/// The CLI and the terminal cockpit both take it, so an action from one
/// never interleaves with a write from the other. Released on drop.
pub struct LogLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not lock {path}: another tc process is writing")]
    Timeout { path: PathBuf },
}

impl LogLock {
    /// Lock `log_dir`, waiting up to `timeout`.
    pub fn acquire(log_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = log_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let start = Instant::now();
        while try_lock(&file).is_err() {
            if start.elapsed() >= timeout {
                return Err(LockError::Timeout { path: lock_path });
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Ok(LogLock {
            _file: file,
            path: lock_path,
        })
    }

    /// Acquire with the default 5 second timeout
    pub fn acquire_default(log_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(log_dir, Duration::from_secs(5))
    }
}

impl Drop for LogLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let result = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
