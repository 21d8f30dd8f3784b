//! crates/tutor_core/src/progress.rs
//!
//! The single source of truth for one learner's longitudinal learning state.
//!
//! Every mutating call updates the in-memory `ProgressRecord` and then rewrites the
//! whole document through the `ProgressRepository`. A failed write is returned to the
//! caller but the in-memory mutation is kept, so memory and storage can diverge until
//! the next successful write.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};

use crate::domain::{
    AssessmentCategory, FavoriteKind, LearningSummary, Level, ProgressRecord, SessionRecord,
};
use crate::ports::{PortError, PortResult, ProgressRepository};

pub struct ProgressStore {
    repository: Arc<dyn ProgressRepository>,
    record: ProgressRecord,
}

impl ProgressStore {
    /// Loads the learner's record, or starts a fresh one if nothing is stored yet.
    pub async fn open(
        learner_id: &str,
        repository: Arc<dyn ProgressRepository>,
    ) -> PortResult<Self> {
        if learner_id.trim().is_empty() {
            return Err(PortError::Validation("Learner id must not be empty".to_string()));
        }
        let record = match repository.load(learner_id).await? {
            Some(record) => record,
            None => {
                info!(learner_id, "No stored progress, starting a new record");
                ProgressRecord::new(learner_id)
            }
        };
        Ok(Self { repository, record })
    }

    pub fn learner_id(&self) -> &str {
        &self.record.learner_id
    }

    /// Read-only snapshot used by the performance analyzer.
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    pub async fn record_session(
        &mut self,
        scenario_id: &str,
        duration_minutes: u32,
        conversation_turns: u32,
        accuracy_rate: f64,
    ) -> PortResult<()> {
        if !accuracy_rate.is_finite() || !(0.0..=1.0).contains(&accuracy_rate) {
            return Err(PortError::Validation(format!(
                "accuracy_rate must be within [0, 1], got {accuracy_rate}"
            )));
        }
        self.record.apply_session(SessionRecord {
            timestamp: Utc::now(),
            scenario_id: scenario_id.to_string(),
            duration_minutes,
            conversation_turns,
            accuracy_rate,
        });
        self.persist().await
    }

    pub async fn record_vocabulary_progress(&mut self, term: &str, correct: bool) -> PortResult<()> {
        self.record.apply_vocabulary_result(term, correct, Utc::now());
        self.persist().await
    }

    /// Unknown categories or levels are ignored: returns `Ok(false)` and nothing is written.
    pub async fn update_level_assessment(&mut self, category: &str, level: &str) -> PortResult<bool> {
        let (category, level) = match (
            category.parse::<AssessmentCategory>(),
            level.parse::<Level>(),
        ) {
            (Ok(category), Ok(level)) => (category, level),
            (category, level) => {
                debug!(?category, ?level, "Ignoring level assessment update");
                return Ok(false);
            }
        };
        self.record.level_assessment.set(category, level);
        self.persist().await?;
        Ok(true)
    }

    /// Returns `Ok(false)` for an unknown kind. Adding an existing id changes nothing.
    pub async fn add_to_favorites(&mut self, kind: &str, id: &str) -> PortResult<bool> {
        let Ok(kind) = kind.parse::<FavoriteKind>() else {
            return Ok(false);
        };
        if self.record.favorites.insert(kind, id) {
            self.persist().await?;
        }
        Ok(true)
    }

    /// Returns `Ok(false)` for an unknown kind. Removing a non-member changes nothing.
    pub async fn remove_from_favorites(&mut self, kind: &str, id: &str) -> PortResult<bool> {
        let Ok(kind) = kind.parse::<FavoriteKind>() else {
            return Ok(false);
        };
        if self.record.favorites.remove(kind, id) {
            self.persist().await?;
        }
        Ok(true)
    }

    pub fn get_learning_summary(&self) -> LearningSummary {
        self.record.summary()
    }

    pub fn get_recommended_scenarios(&self, candidate_ids: &[String], count: usize) -> Vec<String> {
        self.record.recommended_scenarios(candidate_ids, count)
    }

    pub fn get_vocabulary_for_review(&self, count: usize) -> Vec<String> {
        self.record.vocabulary_for_review(count)
    }

    /// Replaces both label sets wholesale.
    pub async fn update_strengths_weaknesses(
        &mut self,
        strengths: Vec<String>,
        weaknesses: Vec<String>,
    ) -> PortResult<()> {
        self.record.strengths = strengths;
        self.record.weaknesses = weaknesses;
        self.persist().await
    }

    async fn persist(&self) -> PortResult<()> {
        self.repository.save(&self.record).await.map_err(|e| {
            error!(learner_id = %self.record.learner_id, "Failed to save progress: {}", e);
            e
        })
    }
}
