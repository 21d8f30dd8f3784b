//! crates/tutor_core/src/analysis.rs
//!
//! Stateless derivations over a `ProgressRecord` snapshot: accuracy trend, study
//! frequency, vocabulary mastery buckets and the rule-based advice built from them.

use std::fmt;

use crate::domain::{LearningSummary, ProgressRecord};

/// Number of most recent sessions compared against the overall average.
const RECENT_WINDOW: usize = 5;
const RISING_FACTOR: f64 = 1.1;
const FALLING_FACTOR: f64 = 0.9;
/// Minimum attempts before a term can be judged mastered or struggling.
const MIN_ATTEMPTS: u32 = 2;
const MASTERY_THRESHOLD: f64 = 0.8;
const STRUGGLING_SHARE: f64 = 0.3;
const SHORT_SESSION_MINUTES: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Rising,
    Falling,
    Stable,
    NoData,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
            Trend::NoData => "no data",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFrequency {
    NoData,
    InsufficientData,
    SameDay,
    High,
    Medium,
    Low,
    Sporadic,
}

impl SessionFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionFrequency::NoData => "no data",
            SessionFrequency::InsufficientData => "insufficient data",
            SessionFrequency::SameDay => "multiple same-day sessions",
            SessionFrequency::High => "high (≥5/week)",
            SessionFrequency::Medium => "medium (3-4/week)",
            SessionFrequency::Low => "low (1-2/week)",
            SessionFrequency::Sporadic => "sporadic (<1/week)",
        }
    }

    fn from_sessions_per_week(per_week: f64) -> Self {
        if per_week >= 5.0 {
            SessionFrequency::High
        } else if per_week >= 3.0 {
            SessionFrequency::Medium
        } else if per_week >= 1.0 {
            SessionFrequency::Low
        } else {
            SessionFrequency::Sporadic
        }
    }
}

impl fmt::Display for SessionFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionAnalysis {
    pub average_accuracy: f64,
    pub recent_accuracy: f64,
    pub trend: Trend,
    pub total_sessions: usize,
    pub total_time: u64,
    pub session_frequency: SessionFrequency,
}

impl SessionAnalysis {
    /// The result reported for a learner without any sessions.
    pub fn no_data() -> Self {
        Self {
            average_accuracy: 0.0,
            recent_accuracy: 0.0,
            trend: Trend::NoData,
            total_sessions: 0,
            total_time: 0,
            session_frequency: SessionFrequency::NoData,
        }
    }

    pub fn average_session_minutes(&self) -> f64 {
        if self.total_sessions == 0 {
            0.0
        } else {
            self.total_time as f64 / self.total_sessions as f64
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VocabularyMastery {
    pub total_vocabulary: usize,
    pub mastered_count: usize,
    pub learning_count: usize,
    pub struggling_count: usize,
    pub mastery_rate: f64,
}

/// Everything the learner-facing report shows, computed from one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningReport {
    pub summary: LearningSummary,
    pub sessions: SessionAnalysis,
    pub vocabulary: VocabularyMastery,
    pub insights: Vec<String>,
}

pub fn analyze_session_history(progress: &ProgressRecord) -> SessionAnalysis {
    let history = &progress.session_history;
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return SessionAnalysis::no_data();
    };

    let n = history.len();
    let average_accuracy = history.iter().map(|s| s.accuracy_rate).sum::<f64>() / n as f64;
    let recent = &history[n.saturating_sub(RECENT_WINDOW)..];
    let recent_accuracy = recent.iter().map(|s| s.accuracy_rate).sum::<f64>() / recent.len() as f64;

    let trend = if recent_accuracy > average_accuracy * RISING_FACTOR {
        Trend::Rising
    } else if recent_accuracy < average_accuracy * FALLING_FACTOR {
        Trend::Falling
    } else {
        Trend::Stable
    };

    let session_frequency = if n <= 1 {
        SessionFrequency::InsufficientData
    } else {
        let elapsed_days = (last.timestamp.date_naive() - first.timestamp.date_naive()).num_days();
        if elapsed_days == 0 {
            SessionFrequency::SameDay
        } else {
            SessionFrequency::from_sessions_per_week(n as f64 / elapsed_days as f64 * 7.0)
        }
    };

    SessionAnalysis {
        average_accuracy,
        recent_accuracy,
        trend,
        total_sessions: n,
        total_time: history.iter().map(|s| u64::from(s.duration_minutes)).sum(),
        session_frequency,
    }
}

pub fn analyze_vocabulary_mastery(progress: &ProgressRecord) -> VocabularyMastery {
    let stats = &progress.vocabulary_stats;
    if stats.is_empty() {
        return VocabularyMastery::default();
    }

    let mut mastery = VocabularyMastery {
        total_vocabulary: stats.len(),
        ..VocabularyMastery::default()
    };
    for (_, stat) in stats.iter() {
        if stat.total_count < MIN_ATTEMPTS {
            mastery.learning_count += 1;
        } else if stat.accuracy() >= MASTERY_THRESHOLD {
            mastery.mastered_count += 1;
        } else {
            mastery.struggling_count += 1;
        }
    }
    mastery.mastery_rate = mastery.mastered_count as f64 / mastery.total_vocabulary as f64;
    mastery
}

pub const ADVICE_STUDY_MORE_OFTEN: &str =
    "Try to study more often. Three or more sessions a week works best.";
pub const ADVICE_REVIEW_FUNDAMENTALS: &str =
    "Your recent accuracy has dropped. Go back over the fundamentals and review.";
pub const ADVICE_KEEP_GOING: &str = "You're making progress! Keep it up.";
pub const ADVICE_VOCABULARY_DRILL: &str =
    "Quite a few words are giving you trouble. Drill them with flashcards.";
pub const ADVICE_LONGER_SESSIONS: &str =
    "Your sessions are short. Set aside a focused block of 15-20 minutes.";
pub const GENERIC_ADVICE: [&str; 3] = [
    "Keep up a regular study routine.",
    "Try a new scenario to grow your vocabulary.",
    "Listen back to your conversations to check pronunciation and fluency.",
];

/// Advisory strings in fixed priority order; the generic advice when no rule fires.
pub fn generate_learning_insights(progress: &ProgressRecord) -> Vec<String> {
    insights_from(
        &analyze_session_history(progress),
        &analyze_vocabulary_mastery(progress),
    )
}

fn insights_from(sessions: &SessionAnalysis, vocabulary: &VocabularyMastery) -> Vec<String> {
    let mut insights = Vec::new();

    if matches!(
        sessions.session_frequency,
        SessionFrequency::Sporadic | SessionFrequency::InsufficientData
    ) {
        insights.push(ADVICE_STUDY_MORE_OFTEN);
    }

    match sessions.trend {
        Trend::Falling => insights.push(ADVICE_REVIEW_FUNDAMENTALS),
        Trend::Rising => insights.push(ADVICE_KEEP_GOING),
        Trend::Stable | Trend::NoData => {}
    }

    if vocabulary.struggling_count as f64 > vocabulary.total_vocabulary as f64 * STRUGGLING_SHARE {
        insights.push(ADVICE_VOCABULARY_DRILL);
    }

    if sessions.average_session_minutes() < SHORT_SESSION_MINUTES {
        insights.push(ADVICE_LONGER_SESSIONS);
    }

    if insights.is_empty() {
        insights.extend(GENERIC_ADVICE);
    }
    insights.into_iter().map(str::to_string).collect()
}

pub fn build_report(progress: &ProgressRecord) -> LearningReport {
    let sessions = analyze_session_history(progress);
    let vocabulary = analyze_vocabulary_mastery(progress);
    let insights = insights_from(&sessions, &vocabulary);
    LearningReport {
        summary: progress.summary(),
        sessions,
        vocabulary,
        insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionRecord, VocabularyStat};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn with_sessions(sessions: &[(i64, u32, f64)]) -> ProgressRecord {
        let mut record = ProgressRecord::new("learner");
        for &(offset_hours, minutes, accuracy) in sessions {
            record.apply_session(SessionRecord {
                timestamp: start() + Duration::hours(offset_hours),
                scenario_id: "cafe_ordering".to_string(),
                duration_minutes: minutes,
                conversation_turns: 4,
                accuracy_rate: accuracy,
            });
        }
        record
    }

    fn stat(correct: u32, total: u32) -> VocabularyStat {
        VocabularyStat {
            correct_count: correct,
            total_count: total,
            last_practiced_at: None,
        }
    }

    #[test]
    fn empty_history_reports_no_data() {
        let analysis = analyze_session_history(&ProgressRecord::new("learner"));
        assert_eq!(analysis, SessionAnalysis::no_data());
        assert_eq!(analysis.trend.as_str(), "no data");
    }

    #[test]
    fn steady_improvement_over_three_sessions_is_stable() {
        let record = with_sessions(&[(0, 15, 0.7), (24, 15, 0.8), (48, 15, 0.9)]);
        let analysis = analyze_session_history(&record);

        assert!((analysis.average_accuracy - 0.8).abs() < 1e-9);
        assert!((analysis.recent_accuracy - 0.8).abs() < 1e-9);
        assert_eq!(analysis.trend, Trend::Stable);
        assert_eq!(analysis.total_sessions, 3);
        assert_eq!(analysis.total_time, 45);
    }

    #[test]
    fn recent_window_detects_rising_and_falling() {
        let rising = with_sessions(&[
            (0, 20, 0.2),
            (1, 20, 0.2),
            (2, 20, 0.2),
            (3, 20, 0.9),
            (4, 20, 0.9),
            (5, 20, 0.9),
            (6, 20, 0.9),
            (7, 20, 0.9),
        ]);
        assert_eq!(analyze_session_history(&rising).trend, Trend::Rising);

        let falling = with_sessions(&[
            (0, 20, 0.9),
            (1, 20, 0.9),
            (2, 20, 0.9),
            (3, 20, 0.3),
            (4, 20, 0.3),
            (5, 20, 0.3),
            (6, 20, 0.3),
            (7, 20, 0.3),
        ]);
        let analysis = analyze_session_history(&falling);
        assert_eq!(analysis.trend, Trend::Falling);
        assert!((analysis.recent_accuracy - 0.3).abs() < 1e-9);
    }

    #[test]
    fn frequency_uses_calendar_days() {
        let single = with_sessions(&[(0, 10, 0.5)]);
        assert_eq!(
            analyze_session_history(&single).session_frequency,
            SessionFrequency::InsufficientData
        );

        let same_day = with_sessions(&[(0, 10, 0.5), (5, 10, 0.5)]);
        assert_eq!(
            analyze_session_history(&same_day).session_frequency,
            SessionFrequency::SameDay
        );

        // 23:00 to 01:00 the next day is two hours apart but one calendar day.
        let mut across_midnight = ProgressRecord::new("learner");
        for hour in [Utc.with_ymd_and_hms(2024, 3, 1, 23, 0, 0), Utc.with_ymd_and_hms(2024, 3, 2, 1, 0, 0)] {
            across_midnight.apply_session(SessionRecord {
                timestamp: hour.unwrap(),
                scenario_id: "s".to_string(),
                duration_minutes: 10,
                conversation_turns: 2,
                accuracy_rate: 0.5,
            });
        }
        // 2 sessions over 1 day is 14 per week.
        assert_eq!(
            analyze_session_history(&across_midnight).session_frequency,
            SessionFrequency::High
        );
    }

    #[test]
    fn frequency_buckets() {
        let days = |d: i64| d * 24;
        // 4 sessions over 7 days: 4/week.
        let medium = with_sessions(&[(0, 10, 0.5), (days(2), 10, 0.5), (days(4), 10, 0.5), (days(7), 10, 0.5)]);
        assert_eq!(analyze_session_history(&medium).session_frequency, SessionFrequency::Medium);

        // 2 sessions over 7 days: 2/week.
        let low = with_sessions(&[(0, 10, 0.5), (days(7), 10, 0.5)]);
        assert_eq!(analyze_session_history(&low).session_frequency, SessionFrequency::Low);

        // 2 sessions over 28 days: 0.5/week.
        let sporadic = with_sessions(&[(0, 10, 0.5), (days(28), 10, 0.5)]);
        assert_eq!(
            analyze_session_history(&sporadic).session_frequency,
            SessionFrequency::Sporadic
        );
    }

    #[test]
    fn mastery_buckets_match_counts() {
        let mut record = ProgressRecord::new("learner");
        record.vocabulary_stats.insert("w1".into(), stat(5, 5));
        record.vocabulary_stats.insert("w2".into(), stat(3, 5));
        record.vocabulary_stats.insert("w3".into(), stat(1, 5));
        record.vocabulary_stats.insert("w4".into(), stat(0, 1));

        let mastery = analyze_vocabulary_mastery(&record);
        assert_eq!(mastery.total_vocabulary, 4);
        assert_eq!(mastery.mastered_count, 1);
        assert_eq!(mastery.struggling_count, 2);
        assert_eq!(mastery.learning_count, 1);
        assert!((mastery.mastery_rate - 0.25).abs() < 1e-9);
    }

    #[test]
    fn empty_vocabulary_is_all_zero() {
        assert_eq!(
            analyze_vocabulary_mastery(&ProgressRecord::new("learner")),
            VocabularyMastery::default()
        );
    }

    #[test]
    fn insights_follow_priority_order() {
        let mut record = with_sessions(&[(0, 5, 0.9), (24 * 28, 5, 0.9)]);
        record.vocabulary_stats.insert("hard".into(), stat(0, 4));

        assert_eq!(
            generate_learning_insights(&record),
            vec![
                ADVICE_STUDY_MORE_OFTEN,
                ADVICE_VOCABULARY_DRILL,
                ADVICE_LONGER_SESSIONS
            ]
        );
    }

    #[test]
    fn rising_trend_is_encouraged() {
        let record = with_sessions(&[
            (0, 20, 0.1),
            (24, 20, 0.1),
            (48, 20, 0.1),
            (72, 20, 0.9),
            (96, 20, 0.9),
            (120, 20, 0.9),
            (144, 20, 0.9),
            (168, 20, 0.9),
        ]);
        assert_eq!(generate_learning_insights(&record), vec![ADVICE_KEEP_GOING]);
    }

    #[test]
    fn generic_advice_when_nothing_fires() {
        let record = with_sessions(&[(0, 20, 0.8), (24, 20, 0.8), (48, 20, 0.8)]);
        assert_eq!(generate_learning_insights(&record), GENERIC_ADVICE.to_vec());
    }

    #[test]
    fn no_sessions_still_advises_longer_sessions() {
        assert_eq!(
            generate_learning_insights(&ProgressRecord::new("learner")),
            vec![ADVICE_LONGER_SESSIONS]
        );
    }

    #[test]
    fn report_bundles_all_parts() {
        let record = with_sessions(&[(0, 20, 0.8), (24, 20, 0.8), (48, 20, 0.8)]);
        let report = build_report(&record);
        assert_eq!(report.summary.total_sessions, 3);
        assert_eq!(report.sessions.trend, Trend::Stable);
        assert_eq!(report.vocabulary.total_vocabulary, 0);
        assert_eq!(report.insights.len(), 3);
    }
}
