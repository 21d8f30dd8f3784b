//! Property tests for the progress record invariants.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tutor_core::domain::{FavoriteKind, ProgressRecord, SessionRecord};

const TERMS: [&str; 5] = ["menu", "order", "size", "agenda", "concierge"];

fn record_with_results(results: &[(usize, bool)]) -> ProgressRecord {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut record = ProgressRecord::new("prop");
    for &(term, correct) in results {
        record.apply_vocabulary_result(TERMS[term], correct, now);
    }
    record
}

proptest! {
    #[test]
    fn vocabulary_counts_never_exceed_attempts(
        results in prop::collection::vec((0..TERMS.len(), any::<bool>()), 0..60)
    ) {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = ProgressRecord::new("prop");
        let mut calls = [0u32; TERMS.len()];

        for &(term, correct) in &results {
            record.apply_vocabulary_result(TERMS[term], correct, now);
            calls[term] += 1;

            let stat = record.vocabulary_stats.get(TERMS[term]).unwrap();
            prop_assert!(stat.correct_count <= stat.total_count);
            prop_assert_eq!(stat.total_count, calls[term]);
        }

        let distinct = calls.iter().filter(|&&c| c > 0).count();
        prop_assert_eq!(record.aggregate_stats.vocab_learned_count as usize, distinct);
        prop_assert_eq!(record.vocabulary_stats.len(), distinct);
    }

    #[test]
    fn review_is_ordered_by_accuracy(
        results in prop::collection::vec((0..TERMS.len(), any::<bool>()), 0..60),
        count in 0usize..8,
    ) {
        let record = record_with_results(&results);
        let review = record.vocabulary_for_review(count);

        prop_assert!(review.len() <= count);
        prop_assert!(review.len() <= record.vocabulary_stats.len());
        let accuracies: Vec<f64> = review
            .iter()
            .map(|term| record.vocabulary_stats.get(term).unwrap().accuracy())
            .collect();
        prop_assert!(accuracies.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn recommendations_prefer_unseen_scenarios(
        completed in prop::collection::vec(0usize..8, 0..8),
        candidates in prop::collection::vec(0usize..8, 0..10),
        count in 0usize..12,
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = ProgressRecord::new("prop");
        for (i, id) in completed.iter().enumerate() {
            record.apply_session(SessionRecord {
                timestamp: start + Duration::days(i as i64),
                scenario_id: format!("s{id}"),
                duration_minutes: 10,
                conversation_turns: 2,
                accuracy_rate: 0.5,
            });
        }
        let candidate_ids: Vec<String> = candidates.iter().map(|id| format!("s{id}")).collect();
        let result = record.recommended_scenarios(&candidate_ids, count);

        prop_assert_eq!(result.len(), count.min(candidate_ids.len()));
        prop_assert!(result.iter().all(|id| candidate_ids.contains(id)));

        let is_completed = |id: &String| record.completed_scenario_ids.contains(id);
        let first_completed = result.iter().position(is_completed).unwrap_or(result.len());
        prop_assert!(result[first_completed..].iter().all(is_completed));

        // Each group keeps the relative input order.
        let novel: Vec<&String> = candidate_ids.iter().filter(|id| !is_completed(*id)).collect();
        let done: Vec<&String> = candidate_ids.iter().filter(|id| is_completed(*id)).collect();
        let expected: Vec<String> = novel.into_iter().chain(done).take(count).cloned().collect();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn aggregates_equal_their_fold(
        sessions in prop::collection::vec((0u32..90, 0u32..40, 0.0f64..=1.0), 0..30),
        results in prop::collection::vec((0..TERMS.len(), any::<bool>()), 0..30),
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record = record_with_results(&results);
        for (i, &(minutes, turns, accuracy)) in sessions.iter().enumerate() {
            record.apply_session(SessionRecord {
                timestamp: start + Duration::hours(i as i64 * 7),
                scenario_id: format!("s{}", i % 4),
                duration_minutes: minutes,
                conversation_turns: turns,
                accuracy_rate: accuracy,
            });
            prop_assert_eq!(&record.aggregate_stats, &record.fold_aggregates());
        }
        prop_assert_eq!(record.aggregate_stats.total_sessions as usize, sessions.len());
    }

    #[test]
    fn adding_a_favorite_twice_equals_adding_it_once(id in "[a-z]{1,8}", other in "[a-z]{1,8}") {
        let mut once = ProgressRecord::new("prop");
        once.favorites.insert(FavoriteKind::Vocabulary, &id);

        let mut twice = once.clone();
        twice.favorites.insert(FavoriteKind::Vocabulary, &id);
        prop_assert_eq!(&once.favorites, &twice.favorites);

        if other != id {
            prop_assert!(!twice.favorites.remove(FavoriteKind::Vocabulary, &other));
            prop_assert_eq!(&once.favorites, &twice.favorites);
        }
    }
}
