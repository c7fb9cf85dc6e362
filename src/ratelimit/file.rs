//! Cross-process admission control backed by a locked state file.
//!
//! Every caller process on the host opens the same file and takes an exclusive
//! advisory lock (`flock`) around one read-decide-write cycle. The lock is taken per
//! call and never held between calls, so processes interleave at call granularity.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

use crate::observability::metrics;
use crate::ratelimit::clock::{Clock, SystemClock};
use crate::ratelimit::window::{RateLimiterConfig, WindowCounter, WindowState, STATE_LEN};
use crate::ratelimit::AdmissionController;

/// Pause between lock attempts while another process holds the file.
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// Failures inside one admission cycle. Never escapes `try_acquire`.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("state file {path} still locked after {waited:?}")]
    LockAcquisitionFailure { path: PathBuf, waited: Duration },

    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Releases the advisory lock when dropped, on every exit path.
struct LockGuard<'a> {
    file: &'a File,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.file) {
            tracing::warn!(error = %e, "Failed to release state file lock");
        }
    }
}

/// Rate limiter whose window state is shared by every process on the host.
pub struct LocalAdmissionController {
    path: PathBuf,
    config: RateLimiterConfig,
    lock_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl LocalAdmissionController {
    pub fn new(path: impl Into<PathBuf>, config: RateLimiterConfig, lock_timeout: Duration) -> Self {
        Self::with_clock(path, config, lock_timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        path: impl Into<PathBuf>,
        config: RateLimiterConfig,
        lock_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            path: path.into(),
            config,
            lock_timeout,
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Best-effort removal of the shared state file.
    ///
    /// The next `try_acquire` from any process starts from a fresh window.
    pub fn cleanup(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::info!(path = %self.path.display(), "Removed rate limiter state file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove rate limiter state file"
            ),
        }
    }

    /// Read the persisted state without taking a slot. Diagnostic only.
    pub fn snapshot(&self) -> Option<WindowState> {
        let file = File::open(&self.path).ok()?;
        let _guard = self.lock(&file).ok()?;
        read_state(&file).ok().flatten()
    }

    fn acquire(&self) -> Result<bool, AdmissionError> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        let _guard = self.lock(&file)?;

        // Sample time only once the lock is held so that the persisted window start
        // never runs ahead of a later holder's clock reading.
        let now = self.clock.now_millis();
        let state = match read_state(&file).map_err(|source| self.io_error(source))? {
            Some(state) if self.is_plausible(&state, now) => state,
            Some(state) => {
                tracing::warn!(
                    path = %self.path.display(),
                    window_start = state.window_start_epoch_millis,
                    count = state.count,
                    "Discarding implausible rate limiter state"
                );
                WindowState::fresh(now)
            }
            None => WindowState::fresh(now),
        };

        let (next, admitted) = WindowCounter::admit(state, now, &self.config);
        if admitted {
            write_state(&file, &next).map_err(|source| self.io_error(source))?;
        }

        tracing::debug!(
            path = %self.path.display(),
            window_start = next.window_start_epoch_millis,
            count = next.count,
            admitted,
            "Local admission decision"
        );
        Ok(admitted)
    }

    /// Poll the non-blocking lock until it is granted or `lock_timeout` elapses.
    fn lock<'a>(&self, file: &'a File) -> Result<LockGuard<'a>, AdmissionError> {
        let started = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(file) {
                Ok(()) => return Ok(LockGuard { file }),
                Err(e) if is_contended(&e) => {
                    if started.elapsed() >= self.lock_timeout {
                        return Err(AdmissionError::LockAcquisitionFailure {
                            path: self.path.clone(),
                            waited: started.elapsed(),
                        });
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(source) => return Err(self.io_error(source)),
            }
        }
    }

    /// A window start further in the future than one window cannot come from a
    /// sane writer and would otherwise block admission indefinitely.
    fn is_plausible(&self, state: &WindowState, now: i64) -> bool {
        let window = i64::try_from(self.config.window().as_millis()).unwrap_or(i64::MAX);
        state.window_start_epoch_millis <= now.saturating_add(window)
    }

    fn io_error(&self, source: io::Error) -> AdmissionError {
        AdmissionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl AdmissionController for LocalAdmissionController {
    fn try_acquire(&self) -> bool {
        let admitted = match self.acquire() {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::error!(error = %e, "Local admission failed, denying");
                false
            }
        };
        metrics::record_admission("local", admitted);
        admitted
    }
}

fn is_contended(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::WouldBlock
        || e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// `Ok(None)` for an empty, short or garbled file.
fn read_state(mut file: &File) -> io::Result<Option<WindowState>> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::with_capacity(STATE_LEN);
    file.take(STATE_LEN as u64).read_to_end(&mut buf)?;
    Ok(WindowState::decode(&buf))
}

fn write_state(mut file: &File, state: &WindowState) -> io::Result<()> {
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&state.encode())?;
    file.set_len(STATE_LEN as u64)?;
    file.sync_all()
}
