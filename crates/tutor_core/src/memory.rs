//! crates/tutor_core/src/memory.rs
//!
//! In-memory implementations of the persistence ports. Used by tests and by
//! callers that want a throwaway catalogue or progress record.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{ProgressRecord, ScenarioRecord};
use crate::ports::{PortError, PortResult, ProgressRepository, ScenarioRepository};

fn lock<T>(mutex: &Mutex<T>) -> PortResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| PortError::Unexpected("in-memory repository lock poisoned".to_string()))
}

#[derive(Default)]
pub struct InMemoryScenarioRepository {
    records: Mutex<Vec<ScenarioRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryScenarioRepository {
    pub fn with_records(records: Vec<ScenarioRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent `save` fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScenarioRepository for InMemoryScenarioRepository {
    async fn load_all(&self) -> PortResult<Vec<ScenarioRecord>> {
        Ok(lock(&self.records)?.clone())
    }

    async fn save(&self, scenario: &ScenarioRecord) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("write rejected".to_string()));
        }
        let mut records = lock(&self.records)?;
        match records.iter_mut().find(|r| r.id == scenario.id) {
            Some(existing) => *existing = scenario.clone(),
            None => records.push(scenario.clone()),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProgressRepository {
    records: Mutex<HashMap<String, ProgressRecord>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryProgressRepository {
    /// Makes every subsequent `save` fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepository {
    async fn load(&self, learner_id: &str) -> PortResult<Option<ProgressRecord>> {
        Ok(lock(&self.records)?.get(learner_id).cloned())
    }

    async fn save(&self, progress: &ProgressRecord) -> PortResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::Storage("write rejected".to_string()));
        }
        lock(&self.records)?.insert(progress.learner_id.clone(), progress.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
