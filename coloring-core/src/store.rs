//! Progress storage and debounced save scheduling.
//!
//! Persistence is an injected key-value capability: the engine never touches
//! ambient storage directly, so tests run against an in-memory fake and
//! embeddings choose where records actually live. Values are opaque strings
//! (encoded images); keys are opaque identifiers supplied by the caller.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::{CoreError, CoreResult};

/// Default quiet period before a scheduled save fires.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_secs(1);

/// Key-value capability for saved progress records.
pub trait ProgressStore {
    /// Fetch the record stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any existing record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the write fails (e.g. quota or I/O).
    /// Callers catch and log this; a failed save never interrupts drawing.
    fn set(&mut self, key: &str, value: &str) -> CoreResult<()>;

    /// Delete the record stored under `key`. Deleting a missing key is a
    /// no-op.
    fn remove(&mut self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProgressStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.records.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.records.remove(key);
    }
}

/// Filesystem store: one file per sanitized key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `data_dir`, creating the directory if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.rec", sanitize_key(key)))
    }
}

impl ProgressStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Some(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!("Failed to read record {}: {e}", path.display());
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.path_for(key);
        std::fs::write(&path, value)
            .map_err(|e| CoreError::Storage(format!("write {} failed: {e}", path.display())))
    }

    fn remove(&mut self, key: &str) {
        let path = self.path_for(key);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!("Failed to delete record {}: {e}", path.display());
            }
        }
    }
}

/// Sanitize a save key for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Debounce state for progress saves.
///
/// Serializing the surface costs full-buffer work, so saves fire only after
/// a quiet period with no further stroke activity. The scheduler is plain
/// `Instant`-parameterized state: the host's event loop calls
/// [`poll`](Self::poll) at its own cadence, which keeps the behavior
/// deterministic under test.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl SaveScheduler {
    /// Create a scheduler with the default quiet period.
    #[must_use]
    pub fn new() -> Self {
        Self::with_quiet_period(DEFAULT_QUIET_PERIOD)
    }

    /// Create a scheduler with a custom quiet period.
    #[must_use]
    pub fn with_quiet_period(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            deadline: None,
        }
    }

    /// Note stroke activity at `now`. Restarts the quiet period; a pending
    /// save that has not yet fired is pushed back.
    pub fn note_activity(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet_period);
    }

    /// Poll at `now`. Returns `true` exactly once per quiet period that has
    /// elapsed since the most recent activity; the caller performs the save.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Cancel any pending save (canvas unmount, explicit reset).
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Whether a save is scheduled and has not fired yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }
}

impl Default for SaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.get("book-1-page-3").is_none());

        store.set("book-1-page-3", "data:image/png;base64,AAAA").unwrap();
        assert_eq!(
            store.get("book-1-page-3").as_deref(),
            Some("data:image/png;base64,AAAA")
        );

        store.remove("book-1-page-3");
        assert!(store.get("book-1-page-3").is_none());
        // Removing again is a no-op.
        store.remove("book-1-page-3");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = FileStore::new(dir.path()).expect("store");

        store.set("page/one", "record-value").unwrap();
        assert_eq!(store.get("page/one").as_deref(), Some("record-value"));

        // Keys are sanitized to a flat filename.
        assert!(dir.path().join("page_one.rec").exists());

        store.remove("page/one");
        assert!(store.get("page/one").is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut store = FileStore::new(dir.path()).expect("store");
            store.set("k", "v").unwrap();
        }
        let store = FileStore::new(dir.path()).expect("reopened");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("simple"), "simple");
        assert_eq!(sanitize_key("book-1_page"), "book-1_page");
        assert_eq!(sanitize_key("a/b c.d"), "a_b_c_d");
    }

    #[test]
    fn test_scheduler_fires_after_quiet_period() {
        let mut sched = SaveScheduler::with_quiet_period(Duration::from_millis(100));
        let t0 = Instant::now();

        sched.note_activity(t0);
        assert!(!sched.poll(t0 + Duration::from_millis(50)));
        assert!(sched.poll(t0 + Duration::from_millis(100)));
        // Fires once, then goes quiet.
        assert!(!sched.poll(t0 + Duration::from_millis(200)));
        assert!(!sched.is_pending());
    }

    #[test]
    fn test_activity_within_quiet_period_restarts_timer() {
        let mut sched = SaveScheduler::with_quiet_period(Duration::from_millis(100));
        let t0 = Instant::now();

        // N completions each inside the quiet period: one save total.
        let mut fired = 0;
        for i in 0..5 {
            sched.note_activity(t0 + Duration::from_millis(i * 50));
            if sched.poll(t0 + Duration::from_millis(i * 50 + 49)) {
                fired += 1;
            }
        }
        assert_eq!(fired, 0);
        assert!(sched.poll(t0 + Duration::from_millis(4 * 50 + 100)));
        assert_eq!(fired + 1, 1);
    }

    #[test]
    fn test_spaced_completions_each_fire() {
        let mut sched = SaveScheduler::with_quiet_period(Duration::from_millis(100));
        let t0 = Instant::now();

        let mut fired = 0;
        for i in 0..3 {
            let at = t0 + Duration::from_millis(i * 500);
            sched.note_activity(at);
            if sched.poll(at + Duration::from_millis(100)) {
                fired += 1;
            }
        }
        assert_eq!(fired, 3);
    }

    #[test]
    fn test_cancel_drops_pending_save() {
        let mut sched = SaveScheduler::new();
        let t0 = Instant::now();
        sched.note_activity(t0);
        assert!(sched.is_pending());
        sched.cancel();
        assert!(!sched.poll(t0 + DEFAULT_QUIET_PERIOD * 2));
    }
}
