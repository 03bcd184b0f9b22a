// ABOUTME: Activity recorder trait plus file-backed and in-memory implementations.
// ABOUTME: The recorder owns the get-modify-write cycle; transitions stay pure.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{ActivityError, ActivityKey, PromotionActivity};

/// A pure record transition applied through the recorder.
pub type Transition = Box<dyn FnOnce(PromotionActivity) -> PromotionActivity + Send>;

/// Durable ledger of promotion activities.
///
/// Both operations are idempotent under repeated identical transitions.
/// Concurrent writers to the same key are last-writer-wins; the recorder
/// does not lock across processes.
#[async_trait]
pub trait ActivityRecorder: Send + Sync {
    /// Fetch the record for `key`, creating an empty one if absent.
    async fn get_or_create(&self, key: &ActivityKey)
    -> Result<PromotionActivity, ActivityError>;

    /// Apply a transition to the record for `key` and persist the result.
    async fn apply(
        &self,
        key: &ActivityKey,
        transition: Transition,
    ) -> Result<PromotionActivity, ActivityError>;
}

type Ledger = BTreeMap<String, PromotionActivity>;

/// Recorder persisting the ledger as one JSON file in the state dir.
pub struct FileRecorder {
    path: PathBuf,
    // Serializes same-process get-modify-write cycles. Cross-process races
    // remain last-writer-wins.
    lock: Mutex<()>,
}

impl FileRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The default ledger under `~/.local/state/proago/activities.json`.
    pub fn in_state_dir() -> Self {
        Self::new(crate::state_dir().join("activities.json"))
    }

    fn load(&self) -> Result<Ledger, ActivityError> {
        if !self.path.exists() {
            return Ok(Ledger::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn store(&self, ledger: &Ledger) -> Result<(), ActivityError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(ledger)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl ActivityRecorder for FileRecorder {
    async fn get_or_create(
        &self,
        key: &ActivityKey,
    ) -> Result<PromotionActivity, ActivityError> {
        let _guard = self.lock.lock();
        let mut ledger = self.load()?;
        if let Some(existing) = ledger.get(key.name()) {
            return Ok(existing.clone());
        }
        let activity = PromotionActivity::new(key);
        ledger.insert(key.name().to_string(), activity.clone());
        self.store(&ledger)?;
        Ok(activity)
    }

    async fn apply(
        &self,
        key: &ActivityKey,
        transition: Transition,
    ) -> Result<PromotionActivity, ActivityError> {
        let _guard = self.lock.lock();
        let mut ledger = self.load()?;
        let current = ledger
            .remove(key.name())
            .unwrap_or_else(|| PromotionActivity::new(key));
        let updated = transition(current);
        ledger.insert(key.name().to_string(), updated.clone());
        self.store(&ledger)?;
        Ok(updated)
    }
}

/// In-memory recorder for tests and dry runs.
#[derive(Default)]
pub struct MemoryRecorder {
    inner: Mutex<Ledger>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the record for `key`, if one exists.
    pub fn get(&self, key: &ActivityKey) -> Option<PromotionActivity> {
        self.inner.lock().get(key.name()).cloned()
    }
}

#[async_trait]
impl ActivityRecorder for MemoryRecorder {
    async fn get_or_create(
        &self,
        key: &ActivityKey,
    ) -> Result<PromotionActivity, ActivityError> {
        let mut ledger = self.inner.lock();
        Ok(ledger
            .entry(key.name().to_string())
            .or_insert_with(|| PromotionActivity::new(key))
            .clone())
    }

    async fn apply(
        &self,
        key: &ActivityKey,
        transition: Transition,
    ) -> Result<PromotionActivity, ActivityError> {
        let mut ledger = self.inner.lock();
        let current = ledger
            .remove(key.name())
            .unwrap_or_else(|| PromotionActivity::new(key));
        let updated = transition(current);
        ledger.insert(key.name().to_string(), updated.clone());
        Ok(updated)
    }
}
