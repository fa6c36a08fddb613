//! Per-event cooldown shared between `chuuni` processes.
//!
//! State lives in a small JSON file mapping event identifiers to the last
//! accepted play time (unix ms). Every hook fires a fresh process, so the file
//! is the only place the last play time survives.
//!
//! The read-check-write runs under an exclusive lock on a sibling
//! `cooldown.lock`, so one burst of simultaneous hooks claims a window once.
//! If the lock stays busy for [`LOCK_WAIT`] the claim is granted unrecorded.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fd_lock::RwLock;
use tracing::{debug, warn};

use crate::event::HookEvent;
use crate::utils::now_ms;
use crate::Result;

pub const LOCK_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CooldownStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl CooldownStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// [`check_and_claim`](Self::check_and_claim) at the current time, read
    /// once the lock is held.
    pub fn check_and_claim_now(&self, event: HookEvent, window: Duration) -> Result<bool> {
        self.claim(event, window, None)
    }

    /// Returns `true` and records `now_ms` when `event` is outside its
    /// cooldown window; returns `false` without touching state otherwise.
    pub fn check_and_claim(&self, event: HookEvent, window: Duration, now_ms: i64) -> Result<bool> {
        self.claim(event, window, Some(now_ms))
    }

    fn claim(&self, event: HookEvent, window: Duration, at: Option<i64>) -> Result<bool> {
        if let Some(parent) = self.lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        let mut lock = RwLock::new(file);

        let deadline = Instant::now() + LOCK_WAIT;
        loop {
            match lock.try_write() {
                Ok(_guard) => {
                    let now = at.unwrap_or_else(now_ms);
                    return self.claim_locked(event, window, now);
                }
                Err(e) if lock_busy(&e) => {
                    if Instant::now() >= deadline {
                        warn!(target = "cooldown", path = %self.lock_path.display(), "Cooldown lock busy; playing anyway");
                        return Ok(true);
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn claim_locked(&self, event: HookEvent, window: Duration, now_ms: i64) -> Result<bool> {
        let mut state = self.read_state();
        if let Some(&last) = state.get(event.as_str()) {
            let elapsed = now_ms.saturating_sub(last);
            let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
            // a clock that went backwards does not block playback
            if elapsed >= 0 && elapsed < window_ms {
                debug!(
                    target = "cooldown",
                    event = %event,
                    remaining_ms = window_ms - elapsed,
                    "Cooldown active, skipping"
                );
                return Ok(false);
            }
        }
        state.insert(event.as_str().to_string(), now_ms);
        self.write_state(&state)?;
        Ok(true)
    }

    /// Last accepted play time for `event`, if any.
    pub fn last_played(&self, event: HookEvent) -> Option<i64> {
        self.read_state().get(event.as_str()).copied()
    }

    pub fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // Missing or corrupt state counts as empty
    fn read_state(&self) -> BTreeMap<String, i64> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(target = "cooldown", error = %e, "Discarding corrupt cooldown state");
            BTreeMap::new()
        })
    }

    fn write_state(&self, state: &BTreeMap<String, i64>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension(format!("json.{}.tmp", std::process::id()));
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn lock_busy(e: &io::Error) -> bool {
    // ERROR_LOCK_VIOLATION
    e.kind() == io::ErrorKind::WouldBlock || (cfg!(windows) && e.raw_os_error() == Some(33))
}
