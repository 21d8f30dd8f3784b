//! crates/tutor_core/src/scenarios.rs
//!
//! The in-memory catalogue of conversation scenarios, backed by a `ScenarioRepository`.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{is_valid_scenario_id, Level, ScenarioRecord};
use crate::ports::{PortError, PortResult, ScenarioRepository};

pub struct ScenarioStore {
    repository: Arc<dyn ScenarioRepository>,
    // Kept in insertion order; ids are unique.
    scenarios: Vec<ScenarioRecord>,
}

impl ScenarioStore {
    /// Creates an empty store. Call `load_all` to populate it from the repository.
    pub fn new(repository: Arc<dyn ScenarioRepository>) -> Self {
        Self {
            repository,
            scenarios: Vec::new(),
        }
    }

    /// Creates a store and loads the whole catalogue.
    pub async fn open(repository: Arc<dyn ScenarioRepository>) -> PortResult<Self> {
        let mut store = Self::new(repository);
        store.load_all().await?;
        Ok(store)
    }

    /// Replaces the in-memory catalogue with what the repository holds.
    /// A later record with an already-seen id replaces the earlier one in place.
    pub async fn load_all(&mut self) -> PortResult<usize> {
        let records = self.repository.load_all().await?;
        self.scenarios.clear();
        for record in records {
            self.upsert(record);
        }
        info!(count = self.scenarios.len(), "Scenario catalogue loaded");
        Ok(self.scenarios.len())
    }

    pub fn get(&self, id: &str) -> Option<&ScenarioRecord> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn filter_by_level(&self, level: Level) -> Vec<&ScenarioRecord> {
        self.scenarios.iter().filter(|s| s.level == level).collect()
    }

    pub fn filter_by_theme(&self, theme: &str) -> Vec<&ScenarioRecord> {
        self.scenarios.iter().filter(|s| s.theme == theme).collect()
    }

    /// Persists the record first; the catalogue only changes once the write succeeded.
    pub async fn save(&mut self, record: ScenarioRecord) -> PortResult<()> {
        if !is_valid_scenario_id(&record.id) {
            return Err(PortError::Validation(format!(
                "Scenario id '{}' must be non-empty and contain only ASCII letters, digits, '-' or '_'",
                record.id
            )));
        }
        self.repository.save(&record).await?;
        debug!(scenario_id = %record.id, "Scenario saved");
        self.upsert(record);
        Ok(())
    }

    /// Distinct levels in use, sorted by their text form.
    pub fn list_levels(&self) -> Vec<Level> {
        let mut levels: Vec<Level> = Vec::new();
        for scenario in &self.scenarios {
            if !levels.contains(&scenario.level) {
                levels.push(scenario.level);
            }
        }
        levels.sort_by_key(|level| level.as_str());
        levels
    }

    pub fn list_themes(&self) -> Vec<String> {
        let mut themes: Vec<String> = self.scenarios.iter().map(|s| s.theme.clone()).collect();
        themes.sort();
        themes.dedup();
        themes
    }

    pub fn all(&self) -> &[ScenarioRecord] {
        &self.scenarios
    }

    pub fn ids(&self) -> Vec<String> {
        self.scenarios.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    fn upsert(&mut self, record: ScenarioRecord) {
        match self.scenarios.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => self.scenarios.push(record),
        }
    }
}
