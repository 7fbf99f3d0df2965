//! Review session state.
//!
//! A [`ReviewSession`] is the whole mutable state of a review: the dataset
//! under review, the stored assessments, the current position, and the
//! draft assessment being edited. Front ends drive it through explicit
//! method calls and render from its accessors.

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::review::{ReviewState, SaveFile};
use crate::types::{Insight, IssueLevel, JudgeCategory, Judgment, Review, ReviewKey, ReviewStatus};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// The assessment being edited for the current position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub issue_level: Option<IssueLevel>,
    pub explanation: String,
}

impl Draft {
    fn from_review(review: Option<&Review>) -> Self {
        match review {
            Some(r) => Self {
                issue_level: Some(r.issue_level),
                explanation: r.explanation.clone(),
            },
            None => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.issue_level.is_none() && self.explanation.trim().is_empty()
    }
}

/// Result of trying to store the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Stored and written to the save file (see [`ReviewSession::persist_error`])
    Saved,
    /// Nothing to store
    Skipped,
    /// Minor/major issues without an explanation; nothing stored
    NeedsExplanation,
}

/// Mutable state of one review.
#[derive(Debug)]
pub struct ReviewSession {
    dataset: Dataset,
    reviews: ReviewState,
    position: ReviewKey,
    draft: Draft,
    save_path: Option<PathBuf>,
    last_saved: Option<DateTime<Utc>>,
    persist_error: Option<String>,
}

impl ReviewSession {
    /// Start a review from the first judgment.
    pub fn new(dataset: Dataset, save_path: Option<PathBuf>) -> Self {
        let mut session = Self {
            dataset,
            reviews: ReviewState::new(),
            position: ReviewKey::new(0, 0),
            draft: Draft::default(),
            save_path,
            last_saved: None,
            persist_error: None,
        };
        session.load_current();
        session
    }

    /// Continue a saved review. Returns warnings about saved state that did
    /// not fit the loaded data.
    pub fn resume(dataset: Dataset, save: SaveFile, save_path: PathBuf) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let total_insights = dataset.total_insights();
        let total_judges = dataset.total_judges();

        let mut reviews = save.reviews;
        let dropped = reviews.retain_within(total_insights, total_judges);
        if dropped > 0 {
            warnings.push(format!(
                "{} saved reviews point outside the loaded data and were ignored.",
                dropped
            ));
        }

        let mut position = ReviewKey::new(save.current_insight_index, save.current_judge_index);
        if position.insight >= total_insights {
            warnings.push(format!(
                "Saved progress wanted insight #{}, but the data file only has {} insights. \
                 The review was reset to the beginning.",
                position.insight + 1,
                total_insights
            ));
            position = ReviewKey::new(0, 0);
        } else if position.judge >= total_judges {
            warnings.push(format!(
                "Saved progress wanted judge #{}, but only {} judges are configured. \
                 Starting insight #{} from the first judge.",
                position.judge + 1,
                total_judges,
                position.insight + 1
            ));
            position.judge = 0;
        }

        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
        tracing::info!(
            path = %save_path.display(),
            reviews = reviews.len(),
            insight = position.insight,
            judge = position.judge,
            "Resuming review"
        );

        let last_saved = save
            .last_saved
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        let mut session = Self {
            dataset,
            reviews,
            position,
            draft: Draft::default(),
            save_path: Some(save_path),
            last_saved,
            persist_error: None,
        };
        session.load_current();
        (session, warnings)
    }

    /// Open a save file, load the data files it names, and resume.
    ///
    /// `insights` and `workouts` point at relocated data files; when given,
    /// the save is rewritten with the new locations.
    pub fn open_save(
        save_path: &Path,
        insights: Option<&Path>,
        workouts: Option<&Path>,
        categories: Vec<JudgeCategory>,
    ) -> Result<(Self, Vec<String>)> {
        let save = SaveFile::read(save_path)?;

        let insights_path = insights
            .map(Path::to_path_buf)
            .unwrap_or_else(|| save.insights_file.clone());
        let workouts_path = workouts
            .map(Path::to_path_buf)
            .or_else(|| save.workout_file.clone());

        if !insights_path.exists() {
            return Err(Error::MissingFile {
                kind: "insights",
                path: insights_path,
            });
        }
        if let Some(path) = workouts_path.as_ref().filter(|p| !p.exists()) {
            return Err(Error::MissingFile {
                kind: "workout history",
                path: path.clone(),
            });
        }

        let relocated =
            insights_path != save.insights_file || workouts_path != save.workout_file;

        let dataset = Dataset::load(&insights_path, workouts_path.as_deref(), categories)?;
        let (mut session, mut warnings) =
            Self::resume(dataset, save, save_path.to_path_buf());

        if relocated {
            tracing::info!(
                path = %save_path.display(),
                insights = %insights_path.display(),
                "Updating data file locations in save"
            );
            session.persist();
            if let Some(err) = session.persist_error() {
                warnings.push(err.to_string());
            } else {
                warnings.push("Data file locations updated in the save file.".to_string());
            }
        }

        Ok((session, warnings))
    }

    // ========== Accessors ==========

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn reviews(&self) -> &ReviewState {
        &self.reviews
    }

    pub fn position(&self) -> ReviewKey {
        self.position
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Set when the last write of the save file failed; cleared by the next
    /// successful write. The in-memory state stays authoritative meanwhile.
    pub fn persist_error(&self) -> Option<&str> {
        self.persist_error.as_deref()
    }

    pub fn current_insight(&self) -> &Insight {
        // Datasets are never empty and positions are kept in range
        &self.dataset.insights[self.position.insight]
    }

    pub fn current_category(&self) -> &JudgeCategory {
        &self.dataset.categories[self.position.judge]
    }

    pub fn current_judgment(&self) -> Option<&Judgment> {
        self.current_insight().judgment(self.position.judge)
    }

    /// Workout history text for the current insight's user.
    pub fn workout_history(&self) -> String {
        self.dataset
            .workout_history_for(self.current_insight().email.as_deref())
    }

    pub fn status(&self) -> ReviewStatus {
        if self.reviews.contains(self.position) {
            ReviewStatus::Reviewed
        } else {
            ReviewStatus::Pending
        }
    }

    // ========== Draft editing ==========

    pub fn set_issue_level(&mut self, level: IssueLevel) {
        self.draft.issue_level = Some(level);
    }

    pub fn explanation_mut(&mut self) -> &mut String {
        &mut self.draft.explanation
    }

    /// Apply a rating hotkey.
    ///
    /// "No issues" is stored immediately and the review advances. Minor and
    /// major issues are stored only once an explanation exists.
    pub fn rate(&mut self, level: IssueLevel) -> SaveOutcome {
        self.set_issue_level(level);
        let outcome = self.save_draft();
        if level == IssueLevel::NoIssues && outcome == SaveOutcome::Saved {
            self.step_review(true);
        }
        outcome
    }

    /// Store the draft for the current position and write the save file.
    pub fn save_draft(&mut self) -> SaveOutcome {
        if self.draft.is_empty() {
            return SaveOutcome::Skipped;
        }
        let explanation = self.draft.explanation.trim().to_string();
        let Some(level) = self.draft.issue_level else {
            // An explanation without a rating is kept as a draft only
            return SaveOutcome::Skipped;
        };
        if level.requires_explanation() && explanation.is_empty() {
            return SaveOutcome::NeedsExplanation;
        }

        if let Some(existing) = self.reviews.get(self.position) {
            if existing.issue_level == level && existing.explanation == explanation {
                return SaveOutcome::Saved;
            }
        }

        self.reviews
            .record(self.position, Review::new(level, explanation));
        tracing::debug!(
            key = %self.position,
            level = %level,
            "Assessment stored"
        );
        self.persist();
        SaveOutcome::Saved
    }

    /// Store the draft if possible, then write progress regardless.
    pub fn save_now(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        if outcome != SaveOutcome::Saved {
            self.persist();
        }
        outcome
    }

    /// Write the current state to the save file, if the session has one.
    fn persist(&mut self) {
        let Some(path) = self.save_path.clone() else {
            return;
        };
        let mut save = self.to_save_file();
        match save.write(&path) {
            Ok(()) => {
                self.last_saved = Some(Utc::now());
                self.persist_error = None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to save progress");
                self.persist_error = Some(format!("Failed to save progress: {}", e));
            }
        }
    }

    /// Snapshot of the session in save file form.
    pub fn to_save_file(&self) -> SaveFile {
        SaveFile {
            insights_file: self.dataset.insights_path.clone(),
            workout_file: self.dataset.workouts_path.clone(),
            reviews: self.reviews.clone(),
            current_insight_index: self.position.insight,
            current_judge_index: self.position.judge,
            last_saved: None,
            total_insights: self.dataset.total_insights(),
            total_judges: self.dataset.total_judges(),
        }
    }

    // ========== Navigation ==========
    //
    // Every move stores the draft first; the outcome is returned so the
    // front end can warn about an unsaved minor/major rating.

    /// Next judge, rolling into the next insight; wraps at the end.
    pub fn next_review(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.step_review(true);
        outcome
    }

    /// Previous judge, rolling into the previous insight; wraps at the start.
    pub fn previous_review(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.step_review(false);
        outcome
    }

    pub fn next_insight(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.position = ReviewKey::new(wrap_next(self.position.insight, self.total_insights()), 0);
        self.load_current();
        outcome
    }

    pub fn previous_insight(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.position = ReviewKey::new(wrap_prev(self.position.insight, self.total_insights()), 0);
        self.load_current();
        outcome
    }

    pub fn next_judge(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.position.judge = wrap_next(self.position.judge, self.total_judges());
        self.load_current();
        outcome
    }

    pub fn previous_judge(&mut self) -> SaveOutcome {
        let outcome = self.save_draft();
        self.position.judge = wrap_prev(self.position.judge, self.total_judges());
        self.load_current();
        outcome
    }

    /// Jump to a 1-based insight number; the judge resets to the first.
    pub fn jump_to_insight(&mut self, number: usize) -> Result<SaveOutcome> {
        let total = self.total_insights();
        if number < 1 || number > total {
            return Err(Error::InvalidInput(format!(
                "please enter an insight number between 1 and {}",
                total
            )));
        }
        let outcome = self.save_draft();
        self.position = ReviewKey::new(number - 1, 0);
        self.load_current();
        Ok(outcome)
    }

    /// Jump to a 1-based judge number within the current insight.
    pub fn jump_to_judge(&mut self, number: usize) -> Result<SaveOutcome> {
        let total = self.total_judges();
        if number < 1 || number > total {
            return Err(Error::InvalidInput(format!(
                "please enter a judge number between 1 and {}",
                total
            )));
        }
        let outcome = self.save_draft();
        self.position.judge = number - 1;
        self.load_current();
        Ok(outcome)
    }

    fn total_insights(&self) -> usize {
        self.dataset.total_insights()
    }

    fn total_judges(&self) -> usize {
        self.dataset.total_judges()
    }

    fn step_review(&mut self, forward: bool) {
        let judges = self.total_judges();
        let insights = self.total_insights();
        let ReviewKey { insight, judge } = self.position;

        self.position = if forward {
            if judge + 1 < judges {
                ReviewKey::new(insight, judge + 1)
            } else {
                ReviewKey::new(wrap_next(insight, insights), 0)
            }
        } else if judge > 0 {
            ReviewKey::new(insight, judge - 1)
        } else {
            ReviewKey::new(wrap_prev(insight, insights), judges - 1)
        };
        self.load_current();
    }

    /// Reset the draft from the stored review at the current position.
    fn load_current(&mut self) {
        self.draft = Draft::from_review(self.reviews.get(self.position));
    }
}

fn wrap_next(index: usize, len: usize) -> usize {
    if index + 1 < len {
        index + 1
    } else {
        0
    }
}

fn wrap_prev(index: usize, len: usize) -> usize {
    if index > 0 {
        index - 1
    } else {
        len.saturating_sub(1)
    }
}
