//! services/api/src/adapters/fs_store.rs
//!
//! This module contains the JSON-file persistence adapter, the concrete implementation
//! of both the `ScenarioRepository` and `ProgressRepository` ports. Every scenario is one
//! `<id>.json` document and every learner one `progress_<learner_id>.json` document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};
use tutor_core::domain::{
    is_valid_scenario_id, AggregateStats, ExamplePhrase, FavoriteKind, Favorites, GrammarPoint,
    Level, LevelAssessment, ProgressRecord, ScenarioRecord, SessionRecord, VocabularyItem,
    VocabularyStat, VocabularyStats,
};
use tutor_core::ports::{PortError, PortResult, ProgressRepository, ScenarioRepository};

/// The document layout version written by this adapter.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_level() -> String {
    Level::default().as_str().to_string()
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-system adapter that implements both persistence ports.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    scenarios_dir: PathBuf,
    progress_dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore`. Directories are created on first write.
    pub fn new(scenarios_dir: impl Into<PathBuf>, progress_dir: impl Into<PathBuf>) -> Self {
        Self {
            scenarios_dir: scenarios_dir.into(),
            progress_dir: progress_dir.into(),
        }
    }

    pub fn scenario_path(&self, id: &str) -> PathBuf {
        self.scenarios_dir.join(format!("{id}.json"))
    }

    pub fn progress_path(&self, learner_id: &str) -> PathBuf {
        self.progress_dir.join(format!("progress_{learner_id}.json"))
    }
}

//=========================================================================================
// "Impure" Document Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
struct PhraseDocument {
    #[serde(default)]
    source_text: String,
    #[serde(default)]
    translated_text: String,
}

#[derive(Serialize, Deserialize)]
struct VocabularyItemDocument {
    #[serde(default)]
    term: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    example_sentence: String,
}

#[derive(Serialize, Deserialize)]
struct GrammarPointDocument {
    #[serde(default)]
    point_name: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    example_sentence: String,
}

#[derive(Serialize, Deserialize)]
struct ScenarioDocument {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_level")]
    level: String,
    #[serde(default)]
    theme: String,
    #[serde(default)]
    example_phrases: Vec<PhraseDocument>,
    #[serde(default)]
    key_vocabulary: Vec<VocabularyItemDocument>,
    #[serde(default)]
    grammar_points: Vec<GrammarPointDocument>,
}

impl ScenarioDocument {
    fn from_domain(record: &ScenarioRecord) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            level: record.level.as_str().to_string(),
            theme: record.theme.clone(),
            example_phrases: record
                .example_phrases
                .iter()
                .map(|p| PhraseDocument {
                    source_text: p.source_text.clone(),
                    translated_text: p.translated_text.clone(),
                })
                .collect(),
            key_vocabulary: record
                .key_vocabulary
                .iter()
                .map(|v| VocabularyItemDocument {
                    term: v.term.clone(),
                    definition: v.definition.clone(),
                    example_sentence: v.example_sentence.clone(),
                })
                .collect(),
            grammar_points: record
                .grammar_points
                .iter()
                .map(|g| GrammarPointDocument {
                    point_name: g.point_name.clone(),
                    explanation: g.explanation.clone(),
                    example_sentence: g.example_sentence.clone(),
                })
                .collect(),
        }
    }

    /// `file_stem` names the record; a stored id must agree with it.
    fn to_domain(self, file_stem: &str) -> PortResult<ScenarioRecord> {
        check_schema_version(self.schema_version)?;
        if !is_valid_scenario_id(file_stem) {
            return Err(PortError::Storage(format!(
                "File name '{file_stem}' is not a valid scenario id"
            )));
        }
        if !self.id.is_empty() && self.id != file_stem {
            return Err(PortError::Storage(format!(
                "Stored id '{}' does not match the file name '{file_stem}'",
                self.id
            )));
        }
        let id = file_stem.to_string();
        let level = self
            .level
            .parse::<Level>()
            .map_err(|e| PortError::Storage(e.to_string()))?;
        Ok(ScenarioRecord {
            id,
            title: self.title,
            description: self.description,
            level,
            theme: self.theme,
            example_phrases: self
                .example_phrases
                .into_iter()
                .map(|p| ExamplePhrase {
                    source_text: p.source_text,
                    translated_text: p.translated_text,
                })
                .collect(),
            key_vocabulary: self
                .key_vocabulary
                .into_iter()
                .map(|v| VocabularyItem {
                    term: v.term,
                    definition: v.definition,
                    example_sentence: v.example_sentence,
                })
                .collect(),
            grammar_points: self
                .grammar_points
                .into_iter()
                .map(|g| GrammarPoint {
                    point_name: g.point_name,
                    explanation: g.explanation,
                    example_sentence: g.example_sentence,
                })
                .collect(),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct VocabularyStatDocument {
    #[serde(default)]
    correct_count: u32,
    #[serde(default)]
    total_count: u32,
    #[serde(default)]
    last_practiced_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct SessionDocument {
    timestamp: DateTime<Utc>,
    #[serde(default)]
    scenario_id: String,
    #[serde(default)]
    duration_minutes: u32,
    #[serde(default)]
    conversation_turns: u32,
    #[serde(default)]
    accuracy_rate: f64,
}

#[derive(Serialize, Deserialize)]
struct LevelAssessmentDocument {
    #[serde(default = "default_level")]
    overall: String,
    #[serde(default = "default_level")]
    speaking: String,
    #[serde(default = "default_level")]
    listening: String,
    #[serde(default = "default_level")]
    vocabulary: String,
    #[serde(default = "default_level")]
    grammar: String,
}

impl Default for LevelAssessmentDocument {
    fn default() -> Self {
        Self {
            overall: default_level(),
            speaking: default_level(),
            listening: default_level(),
            vocabulary: default_level(),
            grammar: default_level(),
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct AggregateStatsDocument {
    #[serde(default)]
    total_sessions: u32,
    #[serde(default)]
    total_time_minutes: u64,
    #[serde(default)]
    total_conversation_turns: u64,
    #[serde(default)]
    vocab_learned_count: u32,
    #[serde(default)]
    last_session_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Default)]
struct FavoritesDocument {
    #[serde(default)]
    scenarios: Vec<String>,
    #[serde(default)]
    phrases: Vec<String>,
    #[serde(default)]
    vocabulary: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct ProgressDocument {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    learner_id: String,
    #[serde(default)]
    completed_scenario_ids: Vec<String>,
    #[serde(default, with = "ordered_map")]
    vocabulary_stats: Vec<(String, VocabularyStatDocument)>,
    #[serde(default)]
    session_history: Vec<SessionDocument>,
    #[serde(default)]
    level_assessment: LevelAssessmentDocument,
    #[serde(default)]
    aggregate_stats: AggregateStatsDocument,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    favorites: FavoritesDocument,
}

impl ProgressDocument {
    fn from_domain(record: &ProgressRecord) -> Self {
        let levels = &record.level_assessment;
        let stats = &record.aggregate_stats;
        Self {
            schema_version: SCHEMA_VERSION,
            learner_id: record.learner_id.clone(),
            completed_scenario_ids: record.completed_scenario_ids.clone(),
            vocabulary_stats: record
                .vocabulary_stats
                .iter()
                .map(|(term, stat)| {
                    (
                        term.to_string(),
                        VocabularyStatDocument {
                            correct_count: stat.correct_count,
                            total_count: stat.total_count,
                            last_practiced_at: stat.last_practiced_at,
                        },
                    )
                })
                .collect(),
            session_history: record
                .session_history
                .iter()
                .map(|s| SessionDocument {
                    timestamp: s.timestamp,
                    scenario_id: s.scenario_id.clone(),
                    duration_minutes: s.duration_minutes,
                    conversation_turns: s.conversation_turns,
                    accuracy_rate: s.accuracy_rate,
                })
                .collect(),
            level_assessment: LevelAssessmentDocument {
                overall: levels.overall.as_str().to_string(),
                speaking: levels.speaking.as_str().to_string(),
                listening: levels.listening.as_str().to_string(),
                vocabulary: levels.vocabulary.as_str().to_string(),
                grammar: levels.grammar.as_str().to_string(),
            },
            aggregate_stats: AggregateStatsDocument {
                total_sessions: stats.total_sessions,
                total_time_minutes: stats.total_time_minutes,
                total_conversation_turns: stats.total_conversation_turns,
                vocab_learned_count: stats.vocab_learned_count,
                last_session_at: stats.last_session_at,
            },
            strengths: record.strengths.clone(),
            weaknesses: record.weaknesses.clone(),
            favorites: FavoritesDocument {
                scenarios: record.favorites.scenarios.clone(),
                phrases: record.favorites.phrases.clone(),
                vocabulary: record.favorites.vocabulary.clone(),
            },
        }
    }

    fn to_domain(self, learner_id: &str) -> PortResult<ProgressRecord> {
        check_schema_version(self.schema_version)?;
        if !self.learner_id.is_empty() && self.learner_id != learner_id {
            warn!(
                learner_id,
                stored = %self.learner_id,
                "Progress document names a different learner, using the file's learner"
            );
        }

        let parse_level = |value: &str| {
            value
                .parse::<Level>()
                .map_err(|e| PortError::Storage(e.to_string()))
        };
        let levels = &self.level_assessment;
        let level_assessment = LevelAssessment {
            overall: parse_level(&levels.overall)?,
            speaking: parse_level(&levels.speaking)?,
            listening: parse_level(&levels.listening)?,
            vocabulary: parse_level(&levels.vocabulary)?,
            grammar: parse_level(&levels.grammar)?,
        };

        let mut vocabulary_stats = VocabularyStats::default();
        for (term, stat) in self.vocabulary_stats {
            if stat.correct_count > stat.total_count {
                return Err(PortError::Storage(format!(
                    "Vocabulary term '{term}' has more correct answers than attempts"
                )));
            }
            vocabulary_stats.insert(
                term,
                VocabularyStat {
                    correct_count: stat.correct_count,
                    total_count: stat.total_count,
                    last_practiced_at: stat.last_practiced_at,
                },
            );
        }

        let mut completed_scenario_ids: Vec<String> = Vec::new();
        for id in self.completed_scenario_ids {
            if !completed_scenario_ids.contains(&id) {
                completed_scenario_ids.push(id);
            }
        }

        let mut session_history = Vec::with_capacity(self.session_history.len());
        for s in self.session_history {
            if !s.accuracy_rate.is_finite() || !(0.0..=1.0).contains(&s.accuracy_rate) {
                return Err(PortError::Storage(format!(
                    "Session at {} has accuracy_rate {} outside [0, 1]",
                    s.timestamp, s.accuracy_rate
                )));
            }
            session_history.push(SessionRecord {
                timestamp: s.timestamp,
                scenario_id: s.scenario_id,
                duration_minutes: s.duration_minutes,
                conversation_turns: s.conversation_turns,
                accuracy_rate: s.accuracy_rate,
            });
        }

        let mut favorites = Favorites::default();
        for (kind, ids) in [
            (FavoriteKind::Scenarios, self.favorites.scenarios),
            (FavoriteKind::Phrases, self.favorites.phrases),
            (FavoriteKind::Vocabulary, self.favorites.vocabulary),
        ] {
            for id in ids {
                favorites.insert(kind, &id);
            }
        }

        let stored_stats = self.aggregate_stats;
        let mut record = ProgressRecord {
            learner_id: learner_id.to_string(),
            completed_scenario_ids,
            vocabulary_stats,
            session_history,
            level_assessment,
            aggregate_stats: AggregateStats::default(),
            strengths: self.strengths,
            weaknesses: self.weaknesses,
            favorites,
        };

        let stored = AggregateStats {
            total_sessions: stored_stats.total_sessions,
            total_time_minutes: stored_stats.total_time_minutes,
            total_conversation_turns: stored_stats.total_conversation_turns,
            vocab_learned_count: stored_stats.vocab_learned_count,
            last_session_at: stored_stats.last_session_at,
        };
        let folded = record.fold_aggregates();
        if stored != folded {
            warn!(
                learner_id,
                ?stored,
                ?folded,
                "Stored aggregate stats disagree with the history, recomputing"
            );
        }
        record.aggregate_stats = folded;
        Ok(record)
    }
}

fn check_schema_version(version: u32) -> PortResult<()> {
    if version > SCHEMA_VERSION {
        return Err(PortError::Storage(format!(
            "Unsupported schema_version {version} (newest supported is {SCHEMA_VERSION})"
        )));
    }
    Ok(())
}

/// Serializes `[(key, value)]` as a JSON object, keeping the entry order both ways.
mod ordered_map {
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S, V>(entries: &Vec<(String, V)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Vec<(String, V)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, V)> =
                    Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    // Duplicate keys: the last value wins, the first position is kept.
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

//=========================================================================================
// File Helpers
//=========================================================================================

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> PortError {
    PortError::Storage(format!("Failed to {action} {}: {e}", path.display()))
}

/// Writes the document next to its destination and renames it into place.
async fn write_atomically(path: &Path, contents: &[u8]) -> PortResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| storage_error("create directory", parent, e))?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents)
        .await
        .map_err(|e| storage_error("write", &tmp_path, e))?;
    fs::rename(&tmp_path, path)
        .await
        .map_err(|e| storage_error("replace", path, e))?;
    Ok(())
}

fn check_learner_id(learner_id: &str) -> PortResult<()> {
    if is_valid_scenario_id(learner_id) {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "Learner id '{learner_id}' may only contain ASCII letters, digits, '-' and '_'"
        )))
    }
}

//=========================================================================================
// `ScenarioRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ScenarioRepository for JsonFileStore {
    /// Reads every `*.json` file in file-name order. Unreadable documents are skipped.
    async fn load_all(&self) -> PortResult<Vec<ScenarioRecord>> {
        let mut dir = match fs::read_dir(&self.scenarios_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = %self.scenarios_dir.display(), "Scenario directory does not exist yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(storage_error("read", &self.scenarios_dir, e)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| storage_error("read", &self.scenarios_dir, e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let decoded = match fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice::<ScenarioDocument>(&bytes)
                    .map_err(|e| PortError::Storage(e.to_string()))
                    .and_then(|doc| doc.to_domain(&stem)),
                Err(e) => Err(storage_error("read", &path, e)),
            };
            match decoded {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable scenario: {}", e),
            }
        }
        Ok(records)
    }

    async fn save(&self, scenario: &ScenarioRecord) -> PortResult<()> {
        if !is_valid_scenario_id(&scenario.id) {
            return Err(PortError::Validation(format!(
                "Scenario id '{}' is not a valid file name",
                scenario.id
            )));
        }
        let json = serde_json::to_vec_pretty(&ScenarioDocument::from_domain(scenario))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        write_atomically(&self.scenario_path(&scenario.id), &json).await
    }
}

//=========================================================================================
// `ProgressRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl ProgressRepository for JsonFileStore {
    async fn load(&self, learner_id: &str) -> PortResult<Option<ProgressRecord>> {
        check_learner_id(learner_id)?;
        let path = self.progress_path(learner_id);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("read", &path, e)),
        };
        let document: ProgressDocument = serde_json::from_slice(&bytes).map_err(|e| {
            PortError::Storage(format!("Malformed progress document {}: {e}", path.display()))
        })?;
        document.to_domain(learner_id).map(Some)
    }

    async fn save(&self, progress: &ProgressRecord) -> PortResult<()> {
        check_learner_id(&progress.learner_id)?;
        let json = serde_json::to_vec_pretty(&ProgressDocument::from_domain(progress))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        write_atomically(&self.progress_path(&progress.learner_id), &json).await
    }
}
