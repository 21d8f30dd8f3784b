//! crates/tutor_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Returned when a textual enum value (level, category, favorite kind) is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

//=========================================================================================
// Enumerations
//=========================================================================================

/// Difficulty grade of a scenario and of a learner's assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Beginner, Level::Intermediate, Level::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    /// The label shown to learners in prompts and feedback.
    pub fn label(&self) -> &'static str {
        match self {
            Level::Beginner => "初級",
            Level::Intermediate => "中級",
            Level::Advanced => "上級",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = UnknownValue;

    /// Accepts the canonical names as well as the learner-facing labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "beginner" | "初級" => Ok(Level::Beginner),
            "intermediate" | "中級" => Ok(Level::Intermediate),
            "advanced" | "上級" => Ok(Level::Advanced),
            other => Err(UnknownValue::new("level", other)),
        }
    }
}

/// The fixed set of skills a learner is assessed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssessmentCategory {
    Overall,
    Speaking,
    Listening,
    Vocabulary,
    Grammar,
}

impl AssessmentCategory {
    pub const ALL: [AssessmentCategory; 5] = [
        AssessmentCategory::Overall,
        AssessmentCategory::Speaking,
        AssessmentCategory::Listening,
        AssessmentCategory::Vocabulary,
        AssessmentCategory::Grammar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentCategory::Overall => "overall",
            AssessmentCategory::Speaking => "speaking",
            AssessmentCategory::Listening => "listening",
            AssessmentCategory::Vocabulary => "vocabulary",
            AssessmentCategory::Grammar => "grammar",
        }
    }
}

impl fmt::Display for AssessmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssessmentCategory {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssessmentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| UnknownValue::new("assessment category", s))
    }
}

/// Which of the three favorites sets an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteKind {
    Scenarios,
    Phrases,
    Vocabulary,
}

impl FavoriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteKind::Scenarios => "scenarios",
            FavoriteKind::Phrases => "phrases",
            FavoriteKind::Vocabulary => "vocabulary",
        }
    }
}

impl FromStr for FavoriteKind {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "scenarios" => Ok(FavoriteKind::Scenarios),
            "phrases" => Ok(FavoriteKind::Phrases),
            "vocabulary" => Ok(FavoriteKind::Vocabulary),
            other => Err(UnknownValue::new("favorite kind", other)),
        }
    }
}

//=========================================================================================
// Scenarios
//=========================================================================================

/// An example sentence and its translation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamplePhrase {
    pub source_text: String,
    pub translated_text: String,
}

/// A key term taught by a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyItem {
    pub term: String,
    pub definition: String,
    pub example_sentence: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GrammarPoint {
    pub point_name: String,
    pub explanation: String,
    pub example_sentence: String,
}

/// A structured conversation template used to drive a learning session.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub level: Level,
    pub theme: String,
    pub example_phrases: Vec<ExamplePhrase>,
    pub key_vocabulary: Vec<VocabularyItem>,
    pub grammar_points: Vec<GrammarPoint>,
}

/// Scenario ids double as file names, so they are limited to a safe alphabet.
pub fn is_valid_scenario_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

//=========================================================================================
// Progress
//=========================================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyStat {
    pub correct_count: u32,
    pub total_count: u32,
    pub last_practiced_at: Option<DateTime<Utc>>,
}

impl VocabularyStat {
    /// Share of correct answers; a term never attempted counts as fully accurate.
    pub fn accuracy(&self) -> f64 {
        if self.total_count == 0 {
            1.0
        } else {
            f64::from(self.correct_count) / f64::from(self.total_count)
        }
    }
}

/// Insertion-ordered mapping of term to its practice statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyStats {
    entries: Vec<(String, VocabularyStat)>,
}

impl VocabularyStats {
    pub fn get(&self, term: &str) -> Option<&VocabularyStat> {
        self.entries.iter().find(|(t, _)| t == term).map(|(_, s)| s)
    }

    /// Returns the stat for `term`, inserting a zeroed one at the end on first sight.
    pub fn entry(&mut self, term: &str) -> &mut VocabularyStat {
        let index = match self.entries.iter().position(|(t, _)| t == term) {
            Some(index) => index,
            None => {
                self.entries.push((term.to_string(), VocabularyStat::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Inserts or replaces a stat, keeping the original position of an existing term.
    pub fn insert(&mut self, term: String, stat: VocabularyStat) {
        *self.entry(&term) = stat;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &VocabularyStat)> {
        self.entries.iter().map(|(t, s)| (t.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One completed learning session. Immutable once appended to the history.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub timestamp: DateTime<Utc>,
    pub scenario_id: String,
    pub duration_minutes: u32,
    pub conversation_turns: u32,
    pub accuracy_rate: f64,
}

/// A learner's level for each of the five assessment categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelAssessment {
    pub overall: Level,
    pub speaking: Level,
    pub listening: Level,
    pub vocabulary: Level,
    pub grammar: Level,
}

impl LevelAssessment {
    pub fn get(&self, category: AssessmentCategory) -> Level {
        match category {
            AssessmentCategory::Overall => self.overall,
            AssessmentCategory::Speaking => self.speaking,
            AssessmentCategory::Listening => self.listening,
            AssessmentCategory::Vocabulary => self.vocabulary,
            AssessmentCategory::Grammar => self.grammar,
        }
    }

    pub fn set(&mut self, category: AssessmentCategory, level: Level) {
        let slot = match category {
            AssessmentCategory::Overall => &mut self.overall,
            AssessmentCategory::Speaking => &mut self.speaking,
            AssessmentCategory::Listening => &mut self.listening,
            AssessmentCategory::Vocabulary => &mut self.vocabulary,
            AssessmentCategory::Grammar => &mut self.grammar,
        };
        *slot = level;
    }
}

/// Counters derived from the history and vocabulary stats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub total_sessions: u32,
    pub total_time_minutes: u64,
    pub total_conversation_turns: u64,
    pub vocab_learned_count: u32,
    pub last_session_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Favorites {
    pub scenarios: Vec<String>,
    pub phrases: Vec<String>,
    pub vocabulary: Vec<String>,
}

impl Favorites {
    pub fn get(&self, kind: FavoriteKind) -> &[String] {
        match kind {
            FavoriteKind::Scenarios => &self.scenarios,
            FavoriteKind::Phrases => &self.phrases,
            FavoriteKind::Vocabulary => &self.vocabulary,
        }
    }

    fn get_mut(&mut self, kind: FavoriteKind) -> &mut Vec<String> {
        match kind {
            FavoriteKind::Scenarios => &mut self.scenarios,
            FavoriteKind::Phrases => &mut self.phrases,
            FavoriteKind::Vocabulary => &mut self.vocabulary,
        }
    }

    /// Returns true when the set changed.
    pub fn insert(&mut self, kind: FavoriteKind, id: &str) -> bool {
        let set = self.get_mut(kind);
        if set.iter().any(|existing| existing == id) {
            return false;
        }
        set.push(id.to_string());
        true
    }

    /// Returns true when the set changed.
    pub fn remove(&mut self, kind: FavoriteKind, id: &str) -> bool {
        let set = self.get_mut(kind);
        let before = set.len();
        set.retain(|existing| existing != id);
        set.len() != before
    }
}

/// The durable per-learner learning state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub learner_id: String,
    pub completed_scenario_ids: Vec<String>,
    pub vocabulary_stats: VocabularyStats,
    pub session_history: Vec<SessionRecord>,
    pub level_assessment: LevelAssessment,
    pub aggregate_stats: AggregateStats,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub favorites: Favorites,
}

impl ProgressRecord {
    pub fn new(learner_id: impl Into<String>) -> Self {
        Self {
            learner_id: learner_id.into(),
            completed_scenario_ids: Vec::new(),
            vocabulary_stats: VocabularyStats::default(),
            session_history: Vec::new(),
            level_assessment: LevelAssessment::default(),
            aggregate_stats: AggregateStats::default(),
            strengths: Vec::new(),
            weaknesses: Vec::new(),
            favorites: Favorites::default(),
        }
    }

    /// Appends a session and advances the aggregate counters by its deltas.
    pub fn apply_session(&mut self, session: SessionRecord) {
        if !self.completed_scenario_ids.contains(&session.scenario_id) {
            self.completed_scenario_ids.push(session.scenario_id.clone());
        }
        let stats = &mut self.aggregate_stats;
        stats.total_sessions += 1;
        stats.total_time_minutes += u64::from(session.duration_minutes);
        stats.total_conversation_turns += u64::from(session.conversation_turns);
        stats.last_session_at = Some(session.timestamp);
        self.session_history.push(session);
    }

    pub fn apply_vocabulary_result(&mut self, term: &str, correct: bool, at: DateTime<Utc>) {
        let stat = self.vocabulary_stats.entry(term);
        stat.total_count += 1;
        if correct {
            stat.correct_count += 1;
        }
        stat.last_practiced_at = Some(at);
        self.aggregate_stats.vocab_learned_count = self.vocabulary_stats.len() as u32;
    }

    /// Folds the history and vocabulary stats into fresh aggregate counters.
    pub fn fold_aggregates(&self) -> AggregateStats {
        AggregateStats {
            total_sessions: self.session_history.len() as u32,
            total_time_minutes: self
                .session_history
                .iter()
                .map(|s| u64::from(s.duration_minutes))
                .sum(),
            total_conversation_turns: self
                .session_history
                .iter()
                .map(|s| u64::from(s.conversation_turns))
                .sum(),
            vocab_learned_count: self.vocabulary_stats.len() as u32,
            last_session_at: self.session_history.last().map(|s| s.timestamp),
        }
    }

    /// Up to `count` candidates, unseen scenarios first, each group in input order.
    pub fn recommended_scenarios(&self, candidate_ids: &[String], count: usize) -> Vec<String> {
        let (novel, completed): (Vec<&String>, Vec<&String>) = candidate_ids
            .iter()
            .partition(|id| !self.completed_scenario_ids.contains(id));
        novel
            .into_iter()
            .chain(completed)
            .take(count)
            .cloned()
            .collect()
    }

    /// Up to `count` terms, least accurate first. Unattempted terms sort last.
    pub fn vocabulary_for_review(&self, count: usize) -> Vec<String> {
        let mut terms: Vec<(&str, f64)> = self
            .vocabulary_stats
            .iter()
            .map(|(term, stat)| (term, stat.accuracy()))
            .collect();
        // `sort_by` is stable, so equal accuracies keep map order.
        terms.sort_by(|a, b| a.1.total_cmp(&b.1));
        terms
            .into_iter()
            .take(count)
            .map(|(term, _)| term.to_string())
            .collect()
    }

    pub fn summary(&self) -> LearningSummary {
        LearningSummary {
            total_sessions: self.aggregate_stats.total_sessions,
            total_time_minutes: self.aggregate_stats.total_time_minutes,
            vocab_learned_count: self.aggregate_stats.vocab_learned_count,
            scenarios_completed: self.completed_scenario_ids.len(),
            current_level: self.level_assessment.overall,
            strengths: self.strengths.clone(),
            weaknesses: self.weaknesses.clone(),
        }
    }
}

/// Read-only projection of a progress record shown to the learner.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningSummary {
    pub total_sessions: u32,
    pub total_time_minutes: u64,
    pub vocab_learned_count: u32,
    pub scenarios_completed: usize,
    pub current_level: Level,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

//=========================================================================================
// Conversation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

impl FromStr for ChatRole {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "system" => Ok(ChatRole::System),
            "user" => Ok(ChatRole::User),
            "assistant" => Ok(ChatRole::Assistant),
            other => Err(UnknownValue::new("chat role", other)),
        }
    }
}

/// A single role-tagged message of a conversation with the tutor.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, day, 9, 0, 0).unwrap()
    }

    fn session(scenario_id: &str, minutes: u32, turns: u32, day: u32) -> SessionRecord {
        SessionRecord {
            timestamp: at(day),
            scenario_id: scenario_id.to_string(),
            duration_minutes: minutes,
            conversation_turns: turns,
            accuracy_rate: 0.5,
        }
    }

    #[test]
    fn level_parses_canonical_names_and_labels() {
        assert_eq!("intermediate".parse::<Level>(), Ok(Level::Intermediate));
        assert_eq!("上級".parse::<Level>(), Ok(Level::Advanced));
        assert!("expert".parse::<Level>().is_err());
    }

    #[test]
    fn apply_session_tracks_completed_ids_once() {
        let mut record = ProgressRecord::new("learner");
        record.apply_session(session("cafe_ordering", 12, 6, 1));
        record.apply_session(session("cafe_ordering", 8, 4, 2));
        record.apply_session(session("hotel_checkin", 5, 2, 3));

        assert_eq!(record.completed_scenario_ids, vec!["cafe_ordering", "hotel_checkin"]);
        assert_eq!(record.aggregate_stats.total_sessions, 3);
        assert_eq!(record.aggregate_stats.total_time_minutes, 25);
        assert_eq!(record.aggregate_stats.total_conversation_turns, 12);
        assert_eq!(record.aggregate_stats.last_session_at, Some(at(3)));
        assert_eq!(record.aggregate_stats, record.fold_aggregates());
    }

    #[test]
    fn vocabulary_entries_keep_first_sight_order() {
        let mut record = ProgressRecord::new("learner");
        record.apply_vocabulary_result("menu", true, at(1));
        record.apply_vocabulary_result("order", false, at(1));
        record.apply_vocabulary_result("menu", false, at(2));

        let terms: Vec<&str> = record.vocabulary_stats.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["menu", "order"]);
        let menu = record.vocabulary_stats.get("menu").unwrap();
        assert_eq!((menu.correct_count, menu.total_count), (1, 2));
        assert_eq!(menu.last_practiced_at, Some(at(2)));
        assert_eq!(record.aggregate_stats.vocab_learned_count, 2);
    }

    #[test]
    fn favorites_behave_as_sets() {
        let mut favorites = Favorites::default();
        assert!(favorites.insert(FavoriteKind::Phrases, "p1"));
        assert!(!favorites.insert(FavoriteKind::Phrases, "p1"));
        assert!(!favorites.remove(FavoriteKind::Phrases, "missing"));
        assert!(favorites.remove(FavoriteKind::Phrases, "p1"));
        assert!(favorites.get(FavoriteKind::Phrases).is_empty());
    }

    #[test]
    fn recommendations_prefer_unseen_then_backfill() {
        let mut record = ProgressRecord::new("learner");
        record.apply_session(session("b", 10, 2, 1));
        record.apply_session(session("d", 10, 2, 2));
        let ids: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();

        assert_eq!(record.recommended_scenarios(&ids, 2), vec!["a", "c"]);
        assert_eq!(record.recommended_scenarios(&ids, 3), vec!["a", "c", "b"]);
        assert_eq!(record.recommended_scenarios(&ids, 10), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn review_sorts_by_accuracy_with_unattempted_last() {
        let mut record = ProgressRecord::new("learner");
        record
            .vocabulary_stats
            .insert("never".to_string(), VocabularyStat::default());
        for (term, results) in [
            ("half", vec![true, false]),
            ("perfect", vec![true, true]),
            ("zero", vec![false]),
            ("also_half", vec![false, true]),
        ] {
            for correct in results {
                record.apply_vocabulary_result(term, correct, at(1));
            }
        }

        assert_eq!(
            record.vocabulary_for_review(10),
            vec!["zero", "half", "also_half", "never", "perfect"]
        );
        assert_eq!(record.vocabulary_for_review(2), vec!["zero", "half"]);
    }

    #[test]
    fn scenario_ids_are_restricted_to_file_safe_characters() {
        assert!(is_valid_scenario_id("cafe_ordering-2"));
        assert!(!is_valid_scenario_id(""));
        assert!(!is_valid_scenario_id("../etc/passwd"));
        assert!(!is_valid_scenario_id("hotel checkin"));
    }
}
