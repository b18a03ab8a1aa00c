// Integration tests for the session history archive.
//
// The archive is a single JSON file: most-recent-first, capped at 20 items
// with strict FIFO eviction, degrading to empty/no-op on broken storage.

use podium::analyzer::{AnalysisResult, FrameworkStep, GrammarFix, StructureAnalysis, SubScores};
use podium::history::{HistoryItem, HistoryStore, HISTORY_CAP};
use podium::session::SessionMode;
use std::fs;
use tempfile::TempDir;

fn sample_result(transcript: &str) -> AnalysisResult {
    AnalysisResult {
        overall_score: 82,
        sub_scores: SubScores {
            logic: 80,
            delivery: 75,
            structure: 88,
            vocabulary: 79,
            emotion: 70,
        },
        transcript: transcript.to_string(),
        wpm: 130,
        filler_word_count: 4,
        structure: StructureAnalysis {
            is_prep: true,
            point: "Practice beats talent".to_string(),
            reason: "Skills compound with repetition".to_string(),
            example: "Daily five-minute speeches".to_string(),
            point_restated: "So keep practicing".to_string(),
            feedback: "Clear PREP structure".to_string(),
        },
        sentiment: "confident".to_string(),
        speech_framework: vec![FrameworkStep {
            name: "Hook".to_string(),
            description: "Open with a question".to_string(),
            polished_script: "Have you ever frozen on stage?".to_string(),
        }],
        grammar_analysis: vec![GrammarFix {
            original: "I has practiced".to_string(),
            correction: "I have practiced".to_string(),
            reason: "Subject-verb agreement".to_string(),
        }],
        strengths: vec!["Strong opening".to_string()],
        weaknesses: vec!["Rushed ending".to_string()],
    }
}

fn store_in(dir: &TempDir) -> HistoryStore {
    HistoryStore::new(dir.path().join("history.json"))
}

#[test]
fn append_then_list_round_trips_field_for_field() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let item = HistoryItem::from_result("Why I run", SessionMode::Speech, sample_result("word"));
    store.append(item.clone());

    let listed = store.list();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], item);
}

#[test]
fn twenty_five_appends_leave_the_twenty_most_recent() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    for i in 0..25 {
        let mut item = HistoryItem::from_result(
            &format!("topic-{i}"),
            SessionMode::Express,
            sample_result("text"),
        );
        // Timestamp-derived ids can collide within one test run; eviction is
        // by insertion order, not by id or date.
        item.id = format!("id-{i}");
        store.append(item);
    }

    let listed = store.list();
    assert_eq!(listed.len(), HISTORY_CAP);
    assert_eq!(listed[0].topic, "topic-24", "most recent first");
    assert_eq!(listed[19].topic, "topic-5", "oldest surviving entry");
}

#[test]
fn eviction_is_fifo_by_insertion_not_by_date() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    // Insert items with dates in reverse order; the cap must still evict
    // the earliest-inserted ones.
    for i in 0..22i64 {
        let mut item = HistoryItem::from_result(
            &format!("topic-{i}"),
            SessionMode::Debate,
            sample_result("text"),
        );
        item.id = format!("id-{i}");
        item.date = chrono::Utc::now() - chrono::Duration::hours(i);
        store.append(item);
    }

    let listed = store.list();
    assert_eq!(listed.len(), HISTORY_CAP);
    assert_eq!(listed[0].topic, "topic-21");
    assert!(!listed.iter().any(|item| item.topic == "topic-0"));
    assert!(!listed.iter().any(|item| item.topic == "topic-1"));
}

#[test]
fn find_returns_the_matching_item() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let mut item = HistoryItem::from_result("Find me", SessionMode::Comedy, sample_result("x"));
    item.id = "wanted".to_string();
    store.append(item);

    assert!(store.find("wanted").is_some());
    assert!(store.find("missing").is_none());
}

#[test]
fn absent_storage_degrades_to_an_empty_list() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.list().is_empty());
}

#[test]
fn corrupt_storage_degrades_to_an_empty_list_and_recovers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    fs::write(&path, "{not json at all").unwrap();

    let store = HistoryStore::new(&path);
    assert!(store.list().is_empty(), "corrupt file must read as empty");

    // Appending over the corrupt file must restore a usable archive.
    store.append(HistoryItem::from_result(
        "Fresh start",
        SessionMode::Speech,
        sample_result("y"),
    ));
    assert_eq!(store.list().len(), 1);
}

#[test]
fn nested_result_survives_persistence() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let result = sample_result("the quick brown fox");
    let item = HistoryItem::from_result("Round trip", SessionMode::Speech, result.clone());
    store.append(item);

    let loaded = &store.list()[0];
    assert_eq!(loaded.full_result, result);
    assert_eq!(loaded.full_result.grammar_analysis[0].correction, "I have practiced");
    assert_eq!(loaded.full_result.speech_framework[0].name, "Hook");
}
