//! Sizing state storage.
//!
//! The record is small and always read and written as a whole. Loading is
//! self-healing: a missing, unparseable, or inconsistent record is replaced
//! by the default and written back before anyone sizes from it. Saving is
//! strict: a failed write is an error for the caller.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::domain::SizingState;
use crate::error::{PyramidError, Result};

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the record, substituting (and persisting) the default when it is
    /// missing or corrupt.
    async fn load(&self, today: NaiveDate) -> SizingState;

    /// Overwrite the whole record.
    async fn save(&self, state: &SizingState) -> Result<()>;

    /// Read the record as stored, without defaulting or writing.
    async fn peek(&self) -> Result<Option<SizingState>>;
}

/// JSON file on local disk, replaced atomically via a sibling temp file
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn write_atomic(&self, body: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.tmp_path();
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(body).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self, today: NaiveDate) -> SizingState {
        match self.peek().await {
            Ok(Some(state)) => return state,
            Ok(None) => warn!(
                path = %self.path.display(),
                "no sizing state on disk, starting from default"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                error = %e,
                "sizing state unreadable, resetting to default"
            ),
        }

        let state = SizingState::new(today);
        // A failed write-back resurfaces on the request's own save.
        if let Err(e) = self.save(&state).await {
            error!(path = %self.path.display(), error = %e, "failed to persist default sizing state");
        }
        state
    }

    async fn save(&self, state: &SizingState) -> Result<()> {
        let body = serde_json::to_vec_pretty(state)?;
        self.write_atomic(&body).await.map_err(|e| {
            PyramidError::Persistence(format!("write {}: {}", self.path.display(), e))
        })?;
        debug!(path = %self.path.display(), state = %state, "sizing state saved");
        Ok(())
    }

    async fn peek(&self) -> Result<Option<SizingState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PyramidError::Io(e)),
        };
        let state: SizingState = serde_json::from_str(&raw)?;
        if !state.is_consistent() {
            return Err(PyramidError::InvalidState(format!(
                "consecutive_count {} does not match last_transaction_type {:?}",
                state.streak_count, state.last_direction
            )));
        }
        Ok(Some(state))
    }
}

/// In-process store, for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<SizingState>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SizingState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// Current stored record, if any
    pub fn snapshot(&self) -> Option<SizingState> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make every subsequent save fail
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, today: NaiveDate) -> SizingState {
        if let Some(state) = self.snapshot().filter(SizingState::is_consistent) {
            return state;
        }
        let state = SizingState::new(today);
        if let Err(e) = self.save(&state).await {
            error!(error = %e, "failed to persist default sizing state");
        }
        state
    }

    async fn save(&self, state: &SizingState) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(PyramidError::Persistence(
                "memory store configured to fail".to_string(),
            ));
        }
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = Some(*state);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn peek(&self) -> Result<Option<SizingState>> {
        Ok(self.snapshot())
    }
}
