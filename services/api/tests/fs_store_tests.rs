//! Integration tests for the JSON-file persistence adapter.

use std::sync::Arc;

use api_lib::adapters::JsonFileStore;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use tutor_core::domain::{FavoriteKind, Level, ProgressRecord, SessionRecord};
use tutor_core::ports::{PortError, ProgressRepository, ScenarioRepository};
use tutor_core::seed::sample_scenarios;
use tutor_core::{ProgressStore, ScenarioStore};

fn temp_store() -> (JsonFileStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("scenarios"), dir.path().join("progress"));
    (store, dir)
}

fn sample_progress() -> ProgressRecord {
    let mut record = ProgressRecord::new("learner-1");
    let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 9, 30, 0).unwrap();
    record.apply_session(SessionRecord {
        timestamp: day(1),
        scenario_id: "cafe_ordering".to_string(),
        duration_minutes: 12,
        conversation_turns: 11,
        accuracy_rate: 1.0 / 11.0,
    });
    record.apply_session(SessionRecord {
        timestamp: day(4),
        scenario_id: "hotel_checkin".to_string(),
        duration_minutes: 20,
        conversation_turns: 15,
        accuracy_rate: 14.0 / 15.0,
    });
    // Deliberately not alphabetical: the document must keep insertion order.
    record.apply_vocabulary_result("zebra", true, day(4));
    record.apply_vocabulary_result("apple", false, day(4));
    record.apply_vocabulary_result("zebra", false, day(4));
    record.level_assessment.speaking = Level::Intermediate;
    record.strengths = vec!["listening".to_string()];
    record.favorites.insert(FavoriteKind::Phrases, "Could I have the bill?");
    record
}

#[tokio::test]
async fn missing_directories_mean_empty_storage() {
    let (store, _dir) = temp_store();
    assert!(store.load_all().await.unwrap().is_empty());
    assert!(store.load("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn scenarios_round_trip_in_file_name_order() {
    let (store, _dir) = temp_store();
    for scenario in sample_scenarios() {
        ScenarioRepository::save(&store, &scenario).await.unwrap();
    }
    assert!(store.scenario_path("cafe_ordering").exists());

    let loaded = store.load_all().await.unwrap();
    let ids: Vec<&str> = loaded.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["business_meeting", "cafe_ordering", "hotel_checkin"]);

    for scenario in sample_scenarios() {
        let stored = loaded.iter().find(|s| s.id == scenario.id).unwrap();
        assert_eq!(stored, &scenario);
    }
}

#[tokio::test]
async fn unreadable_scenarios_are_skipped() {
    let (store, dir) = temp_store();
    let scenarios_dir = dir.path().join("scenarios");
    ScenarioRepository::save(&store, &sample_scenarios()[0]).await.unwrap();

    std::fs::write(scenarios_dir.join("broken.json"), "{ not json").unwrap();
    std::fs::write(
        scenarios_dir.join("future.json"),
        r#"{"schema_version": 99, "title": "From the future", "theme": "misc"}"#,
    )
    .unwrap();
    std::fs::write(
        scenarios_dir.join("bad_level.json"),
        r#"{"title": "Odd", "level": "expert", "theme": "misc"}"#,
    )
    .unwrap();
    std::fs::write(
        scenarios_dir.join("stale_copy.json"),
        r#"{"id": "cafe_ordering", "title": "Old café", "theme": "misc"}"#,
    )
    .unwrap();
    std::fs::write(
        scenarios_dir.join("has space.json"),
        r#"{"title": "Spaced", "theme": "misc"}"#,
    )
    .unwrap();
    std::fs::write(scenarios_dir.join("notes.txt"), "ignored").unwrap();
    std::fs::write(
        scenarios_dir.join("minimal.json"),
        r#"{"title": "Minimal", "theme": "misc"}"#,
    )
    .unwrap();

    let loaded = store.load_all().await.unwrap();
    let ids: Vec<&str> = loaded.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["cafe_ordering", "minimal"]);

    assert_eq!(loaded[0].title, sample_scenarios()[0].title);

    let minimal = &loaded[1];
    assert_eq!(minimal.level, Level::Beginner);
    assert!(minimal.example_phrases.is_empty());
    assert!(minimal.description.is_empty());
}

#[tokio::test]
async fn invalid_scenario_ids_are_rejected() {
    let (store, _dir) = temp_store();
    let mut scenario = sample_scenarios().remove(0);
    scenario.id = "../escape".to_string();
    assert!(matches!(
        ScenarioRepository::save(&store, &scenario).await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn progress_round_trips_and_keeps_term_order() {
    let (store, _dir) = temp_store();
    let record = sample_progress();
    ProgressRepository::save(&store, &record).await.unwrap();

    let path = store.progress_path("learner-1");
    assert!(path.ends_with("progress_learner-1.json"));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\"schema_version\": 1"));
    assert!(text.find("\"zebra\"").unwrap() < text.find("\"apple\"").unwrap());

    let loaded = store.load("learner-1").await.unwrap().unwrap();
    assert_eq!(loaded, record);
    let terms: Vec<&str> = loaded.vocabulary_stats.iter().map(|(t, _)| t).collect();
    assert_eq!(terms, vec!["zebra", "apple"]);
}

#[tokio::test]
async fn turn_ratio_accuracies_reload_exactly() {
    let (store, _dir) = temp_store();
    let mut record = ProgressRecord::new("ratios");
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
    for turns in 1..=60u32 {
        for matched in 0..=turns {
            record.apply_session(SessionRecord {
                timestamp: at,
                scenario_id: "cafe_ordering".to_string(),
                duration_minutes: 5,
                conversation_turns: turns,
                accuracy_rate: f64::from(matched) / f64::from(turns),
            });
        }
    }
    ProgressRepository::save(&store, &record).await.unwrap();

    let loaded = store.load("ratios").await.unwrap().unwrap();
    for (stored, reloaded) in record.session_history.iter().zip(&loaded.session_history) {
        assert_eq!(
            stored.accuracy_rate.to_bits(),
            reloaded.accuracy_rate.to_bits(),
            "{} out of {} turns",
            stored.accuracy_rate,
            stored.conversation_turns
        );
    }
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn saving_leaves_no_temporary_file() {
    let (store, dir) = temp_store();
    ProgressRepository::save(&store, &sample_progress()).await.unwrap();
    ProgressRepository::save(&store, &sample_progress()).await.unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path().join("progress"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["progress_learner-1.json".to_string()]);
}

#[tokio::test]
async fn missing_progress_fields_take_defaults() {
    let (store, dir) = temp_store();
    std::fs::create_dir_all(dir.path().join("progress")).unwrap();
    std::fs::write(store.progress_path("sparse"), r#"{"learner_id": "sparse"}"#).unwrap();

    let loaded = store.load("sparse").await.unwrap().unwrap();
    assert_eq!(loaded, ProgressRecord::new("sparse"));
}

#[tokio::test]
async fn malformed_or_newer_progress_is_rejected() {
    let (store, dir) = temp_store();
    std::fs::create_dir_all(dir.path().join("progress")).unwrap();

    std::fs::write(store.progress_path("broken"), "[1, 2,").unwrap();
    assert!(matches!(store.load("broken").await, Err(PortError::Storage(_))));

    std::fs::write(store.progress_path("future"), r#"{"schema_version": 2}"#).unwrap();
    assert!(matches!(store.load("future").await, Err(PortError::Storage(_))));

    std::fs::write(
        store.progress_path("overconfident"),
        r#"{"session_history": [{
            "timestamp": "2024-03-01T10:00:00Z",
            "scenario_id": "cafe_ordering",
            "accuracy_rate": 1.5
        }]}"#,
    )
    .unwrap();
    assert!(matches!(
        store.load("overconfident").await,
        Err(PortError::Storage(_))
    ));

    std::fs::write(
        store.progress_path("impossible"),
        r#"{"vocabulary_stats": {"menu": {"correct_count": 3, "total_count": 1}}}"#,
    )
    .unwrap();
    assert!(matches!(
        store.load("impossible").await,
        Err(PortError::Storage(_))
    ));
}

#[tokio::test]
async fn stored_aggregates_are_recomputed_on_load() {
    let (store, dir) = temp_store();
    std::fs::create_dir_all(dir.path().join("progress")).unwrap();
    std::fs::write(
        store.progress_path("drifted"),
        r#"{
            "learner_id": "drifted",
            "session_history": [{
                "timestamp": "2024-03-01T10:00:00Z",
                "scenario_id": "cafe_ordering",
                "duration_minutes": 15,
                "conversation_turns": 6,
                "accuracy_rate": 0.5
            }],
            "vocabulary_stats": {"menu": {"correct_count": 1, "total_count": 2}},
            "aggregate_stats": {"total_sessions": 99, "total_time_minutes": 1}
        }"#,
    )
    .unwrap();

    let loaded = store.load("drifted").await.unwrap().unwrap();
    assert_eq!(loaded.aggregate_stats, loaded.fold_aggregates());
    assert_eq!(loaded.aggregate_stats.total_sessions, 1);
    assert_eq!(loaded.aggregate_stats.total_time_minutes, 15);
    assert_eq!(loaded.aggregate_stats.vocab_learned_count, 1);
}

#[tokio::test]
async fn learner_ids_must_be_file_safe() {
    let (store, _dir) = temp_store();
    assert!(matches!(
        store.load("../../etc/passwd").await,
        Err(PortError::Validation(_))
    ));
}

#[tokio::test]
async fn stores_persist_across_reopen() {
    let (store, _dir) = temp_store();
    let store = Arc::new(store);

    let mut scenarios = ScenarioStore::new(store.clone());
    for scenario in sample_scenarios() {
        scenarios.save(scenario).await.unwrap();
    }
    let mut progress = ProgressStore::open("learner-2", store.clone()).await.unwrap();
    progress
        .record_session("cafe_ordering", 10, 4, 0.5)
        .await
        .unwrap();
    progress.record_vocabulary_progress("menu", true).await.unwrap();
    assert!(progress
        .update_level_assessment("overall", "上級")
        .await
        .unwrap());

    let reopened = ScenarioStore::open(store.clone()).await.unwrap();
    assert_eq!(reopened.len(), 3);
    assert_eq!(
        reopened.list_themes(),
        vec!["business", "daily_life", "travel"]
    );

    let progress = ProgressStore::open("learner-2", store).await.unwrap();
    let summary = progress.get_learning_summary();
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(summary.vocab_learned_count, 1);
    assert_eq!(summary.current_level, Level::Advanced);
    assert_eq!(
        progress.get_recommended_scenarios(&reopened.ids(), 3),
        vec!["business_meeting", "hotel_checkin", "cafe_ordering"]
    );
}
