//! Integration tests for the metajudge review pipeline
//!
//! These tests use the CSV files in `tests/fixtures/` and walk through a
//! review the way the TUI does: load, search, rate, save, resume, export.

use metajudge_core::config::Config;
use metajudge_core::export::{self, ExportSort};
use metajudge_core::types::{IssueLevel, ReviewKey, ReviewStatus};
use metajudge_core::{
    Dataset, HighlightSearch, ReviewSession, SaveFile, SaveOutcome, SaveStore, Statistics,
};
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the path to a fixture file
fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load_fixtures() -> Dataset {
    let config = Config::default();
    Dataset::load(
        &fixture_path("insights.csv"),
        Some(&fixture_path("workouts.csv")),
        config.review.categories(),
    )
    .expect("fixtures should load")
}

// ============================================
// Loading and search
// ============================================

#[test]
fn test_fixtures_load_cleanly() {
    metajudge_core::logging::init_test();
    let ds = load_fixtures();

    assert!(ds.warnings.is_empty(), "{:?}", ds.warnings);
    assert_eq!(ds.total_insights(), 3);
    assert_eq!(ds.total_judges(), 7);
    assert_eq!(ds.total_reviews(), 21);
    assert!(ds.describe().contains("Data linking: 2/3"));

    let cara = ds.insight(2).unwrap();
    assert_eq!(
        ds.workout_history_for(cara.email.as_deref()),
        "No workout history found for: cara@example.com"
    );
}

#[test]
fn test_search_reasoning_in_workout_history() {
    let ds = load_fixtures();
    let session = ReviewSession::new(ds, None);
    let history = session.workout_history();
    assert!(history.starts_with("Monday: Bench Press"));

    let mut search = HighlightSearch::new();
    search.on_selection(" bench press ", &history);
    assert_eq!(search.occurrences().len(), 2);
    assert_eq!(search.current().unwrap().text(&history), "Bench Press");
    assert_eq!(search.next().unwrap().text(&history), "bench press");
    assert_eq!(search.status_line().as_deref(), Some("2/2 matches for 'bench press'"));
    search.next();
    assert_eq!(search.current_index(), Some(0));
}

// ============================================
// Review, save, resume
// ============================================

#[test]
fn test_review_save_and_resume() {
    let dir = TempDir::new().unwrap();
    let store = SaveStore::open(dir.path().join("saves")).unwrap();
    let insights = fixture_path("insights.csv");
    let workouts = fixture_path("workouts.csv");
    let save_path = store.path_for(&insights, Some(&workouts));

    let mut session = ReviewSession::new(load_fixtures(), Some(save_path.clone()));
    assert_eq!(session.current_category().name(), "factuality");

    // Factuality judge was wrong about the bench press count
    assert_eq!(session.rate(IssueLevel::MajorIssues), SaveOutcome::NeedsExplanation);
    session
        .explanation_mut()
        .push_str("Workout log shows bench press twice, judge said three times is wrong");
    assert_eq!(session.next_review(), SaveOutcome::Saved);
    assert_eq!(session.rate(IssueLevel::NoIssues), SaveOutcome::Saved);
    assert_eq!(session.position(), ReviewKey::new(0, 2));

    session.jump_to_insight(3).unwrap();
    session.jump_to_judge(6).unwrap();
    session.set_issue_level(IssueLevel::MinorIssues);
    session.explanation_mut().push_str("Praise is generic");
    assert_eq!(session.save_now(), SaveOutcome::Saved);
    assert!(session.persist_error().is_none());

    assert_eq!(store.last_review().unwrap(), Some(save_path.clone()));
    assert_eq!(store.find_existing(&insights, Some(&workouts)), Some(save_path.clone()));

    let save = SaveFile::read(&save_path).unwrap();
    assert_eq!(save.total_insights, 3);
    assert_eq!(save.total_judges, 7);
    assert_eq!(save.workout_file.as_deref(), Some(workouts.as_path()));

    let (resumed, warnings) = ReviewSession::resume(load_fixtures(), save, save_path);
    assert!(warnings.is_empty());
    assert_eq!(resumed.position(), ReviewKey::new(2, 5));
    assert_eq!(resumed.status(), ReviewStatus::Reviewed);
    assert_eq!(resumed.draft().issue_level, Some(IssueLevel::MinorIssues));
    assert_eq!(resumed.reviews(), session.reviews());
}

// ============================================
// Export
// ============================================

#[test]
fn test_export_results_and_statistics() {
    let dir = TempDir::new().unwrap();
    let mut session = ReviewSession::new(load_fixtures(), None);
    for _ in 0..7 {
        session.rate(IssueLevel::NoIssues);
    }
    session.set_issue_level(IssueLevel::MajorIssues);
    session.explanation_mut().push_str("pace trend misread");
    session.save_draft();
    assert_eq!(session.reviews().len(), 8);

    let results = dir.path().join("results.csv");
    let rows = export::write_results(
        &results,
        session.dataset(),
        session.reviews(),
        ExportSort::Judge,
    )
    .unwrap();
    assert_eq!(rows, 8);

    let mut reader = csv::Reader::from_path(&results).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 8);
    // Categories sort by name; insight 2 was only reviewed for factuality
    assert_eq!(&records[0][0], "actionability");
    assert_eq!(&records[0][1], "1");
    assert_eq!(&records[1][0], "factuality");
    assert_eq!(&records[1][2], "No Issues");
    assert_eq!(&records[2][0], "factuality");
    assert_eq!(&records[2][1], "2");
    assert_eq!(&records[2][2], "Major Issues");
    assert_eq!(&records[2][7], "ben@example.com");

    let stats = Statistics::compute(session.dataset(), session.reviews());
    assert_eq!(stats.summary.completed, 8);
    assert_eq!(stats.judges[0].category.name(), "factuality");
    assert_eq!(stats.judges[0].issue_rate(), 50.0);

    let stats_path = dir.path().join("stats.csv");
    assert_eq!(export::write_statistics(&stats_path, &stats).unwrap(), 7);
}
