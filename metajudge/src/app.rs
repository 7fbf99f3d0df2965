//! Application state for the TUI.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use metajudge_core::export::{self, ExportSort};
use metajudge_core::{Config, HighlightSearch, IssueLevel, ReviewSession, SaveOutcome, Statistics};

mod prompt;
mod selection;

pub use prompt::prompt_label;
pub use selection::{SourcePanel, TextSelection};

/// Lines moved by PageUp/PageDown in the workout history.
const PAGE_LINES: usize = 10;

/// Current view mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewMode {
    /// Insight, judge verdict, and workout history side by side
    #[default]
    Review,
    /// Summary and per-judge statistics
    Stats,
}

/// What keystrokes currently go to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Hotkeys
    #[default]
    Normal,
    /// Typing into the explanation editor
    Editing,
    /// Selecting text in the insight or reasoning panel
    Selecting,
    /// Single-line prompt in the status bar
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    JumpInsight,
    JumpJudge,
    Query,
    /// Waiting for `i` or `j`
    ExportSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

/// Message shown in the status bar until replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

/// Main application state.
pub struct App {
    /// The review being worked on
    pub session: ReviewSession,
    /// Current view mode
    pub view_mode: ViewMode,
    /// Where keystrokes go
    pub input_mode: InputMode,
    /// Search over the current workout history
    pub search: HighlightSearch,
    /// Workout history for the current insight
    pub workout_history: String,
    /// Active text selection (selection mode only)
    pub selection: Option<TextSelection>,
    /// Text typed into the status bar prompt
    pub prompt_input: String,
    /// Scroll offset for the workout history panel
    pub workout_scroll: usize,
    /// Scroll offset for the statistics view
    pub stats_scroll: usize,
    /// Last status bar message
    pub status: Option<StatusMessage>,
    /// Directory for exported CSV files
    export_dir: PathBuf,
    /// Idle time before an edited explanation is autosaved
    autosave_debounce: Duration,
    /// When the explanation was last edited without being saved
    dirty_since: Option<Instant>,
    /// Whether the app should exit
    pub should_quit: bool,
}

impl App {
    pub fn new(session: ReviewSession, config: &Config) -> Self {
        let workout_history = session.workout_history();
        Self {
            session,
            view_mode: ViewMode::default(),
            input_mode: InputMode::default(),
            search: HighlightSearch::new(),
            workout_history,
            selection: None,
            prompt_input: String::new(),
            workout_scroll: 0,
            stats_scroll: 0,
            status: None,
            export_dir: config.export.dir(),
            autosave_debounce: Duration::from_millis(config.review.autosave_debounce_ms),
            dirty_since: None,
            should_quit: false,
        }
    }

    // ========== Status Bar ==========

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Info);
    }

    pub fn set_warning(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Warning);
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.set_status(text, StatusKind::Error);
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    /// Surface the result of a save attempt.
    fn report_save(&mut self, outcome: SaveOutcome) {
        if outcome == SaveOutcome::NeedsExplanation {
            self.set_warning("Explanation required for minor/major issues; assessment not saved");
        }
        if let Some(err) = self.session.persist_error() {
            let err = err.to_string();
            self.set_error(err);
        }
    }

    // ========== Timers ==========

    /// Called on every UI tick. Autosaves an explanation once it has been
    /// idle for the configured debounce.
    pub fn tick(&mut self, now: Instant) {
        let Some(since) = self.dirty_since else {
            return;
        };
        if now.duration_since(since) < self.autosave_debounce {
            return;
        }
        self.dirty_since = None;
        let outcome = self.session.save_draft();
        // Mid-edit, an empty explanation is not worth a warning yet
        if self.input_mode == InputMode::Editing && outcome == SaveOutcome::NeedsExplanation {
            return;
        }
        self.report_save(outcome);
    }

    pub fn mark_dirty(&mut self) {
        self.dirty_since = Some(Instant::now());
    }

    // ========== Key Handling ==========

    /// Handle keyboard input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.input_mode {
            InputMode::Editing => self.handle_editor_key(key),
            InputMode::Selecting => self.handle_selection_key(key),
            InputMode::Prompt(kind) => self.handle_prompt_key(kind, key),
            InputMode::Normal => match self.view_mode {
                ViewMode::Review => self.handle_review_key(key),
                ViewMode::Stats => self.handle_stats_key(key),
            },
        }
    }

    /// Handle keyboard input in the review view.
    fn handle_review_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.quit();
            }
            KeyCode::Left if ctrl => {
                let outcome = self.session.previous_insight();
                self.after_move(outcome);
            }
            KeyCode::Right if ctrl => {
                let outcome = self.session.next_insight();
                self.after_move(outcome);
            }
            KeyCode::Up if ctrl => {
                let outcome = self.session.previous_judge();
                self.after_move(outcome);
            }
            KeyCode::Down if ctrl => {
                let outcome = self.session.next_judge();
                self.after_move(outcome);
            }
            KeyCode::Char(c @ ('1' | '2' | '3')) => {
                if let Some(level) = IssueLevel::from_hotkey(c) {
                    self.rate(level);
                }
            }
            KeyCode::Char('n') | KeyCode::Right => {
                let outcome = self.session.next_review();
                self.after_move(outcome);
            }
            KeyCode::Char('p') | KeyCode::Left => {
                let outcome = self.session.previous_review();
                self.after_move(outcome);
            }
            KeyCode::Char('d') => {
                self.next_match();
            }
            KeyCode::Char('a') => {
                self.previous_match();
            }
            KeyCode::Char(':') => {
                self.open_prompt(PromptKind::JumpInsight);
            }
            KeyCode::Char(';') => {
                self.open_prompt(PromptKind::JumpJudge);
            }
            KeyCode::Char('/') => {
                self.open_prompt(PromptKind::Query);
            }
            KeyCode::Char('v') => {
                self.start_selection();
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                self.input_mode = InputMode::Editing;
            }
            KeyCode::Esc => {
                self.search.clear();
                self.status = None;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.workout_scroll = self.workout_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.workout_scroll = self.workout_scroll.saturating_sub(1);
            }
            KeyCode::PageDown => {
                self.workout_scroll = self.workout_scroll.saturating_add(PAGE_LINES);
            }
            KeyCode::PageUp => {
                self.workout_scroll = self.workout_scroll.saturating_sub(PAGE_LINES);
            }
            KeyCode::Char('s') => {
                self.open_stats_view();
            }
            KeyCode::Char('x') => {
                self.open_prompt(PromptKind::ExportSort);
            }
            KeyCode::Char('X') => {
                self.export_statistics();
            }
            KeyCode::Char('w') => {
                self.save_now();
            }
            KeyCode::Char('q') => {
                self.quit();
            }
            _ => {}
        }
    }

    /// Handle keyboard input in the statistics view.
    fn handle_stats_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('q') => {
                self.view_mode = ViewMode::Review;
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.stats_scroll = self.stats_scroll.saturating_add(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.stats_scroll = self.stats_scroll.saturating_sub(1);
            }
            KeyCode::Char('x') => {
                self.open_prompt(PromptKind::ExportSort);
            }
            KeyCode::Char('X') => {
                self.export_statistics();
            }
            _ => {}
        }
    }

    /// Handle keyboard input in the explanation editor.
    fn handle_editor_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.dirty_since = None;
                let outcome = self.session.save_draft();
                self.report_save(outcome);
            }
            KeyCode::Enter => {
                self.session.explanation_mut().push('\n');
                self.mark_dirty();
            }
            KeyCode::Backspace => {
                self.session.explanation_mut().pop();
                self.mark_dirty();
            }
            KeyCode::Char(c) => {
                self.session.explanation_mut().push(c);
                self.mark_dirty();
            }
            _ => {}
        }
    }

    // ========== Review Actions ==========

    /// Apply a rating hotkey.
    fn rate(&mut self, level: IssueLevel) {
        let position = self.session.position();
        let outcome = self.session.rate(level);
        if level.requires_explanation() {
            self.input_mode = InputMode::Editing;
            if outcome == SaveOutcome::NeedsExplanation {
                self.set_info(format!("{}: explain the issue, Esc when done", level));
            } else {
                self.report_save(outcome);
            }
        } else if self.session.position() != position {
            self.after_move(outcome);
        } else {
            self.report_save(outcome);
        }
    }

    /// Refresh everything that depends on the current position.
    fn after_move(&mut self, outcome: SaveOutcome) {
        self.dirty_since = None;
        self.status = None;
        self.selection = None;
        self.workout_scroll = 0;
        self.workout_history = self.session.workout_history();
        if self.search.is_active() {
            let query = self.search.query().to_string();
            self.search.search(&query, &self.workout_history);
            self.scroll_to_current_match();
        }
        self.report_save(outcome);
    }

    fn next_match(&mut self) {
        if self.search.next().is_some() {
            self.scroll_to_current_match();
        }
    }

    fn previous_match(&mut self) {
        if self.search.prev().is_some() {
            self.scroll_to_current_match();
        }
    }

    /// Bring the current match's line to the top of the workout panel.
    fn scroll_to_current_match(&mut self) {
        if let Some(occurrence) = self.search.current() {
            let start = occurrence.byte_range.start;
            self.workout_scroll = self.workout_history[..start].matches('\n').count();
        }
    }

    fn save_now(&mut self) {
        self.dirty_since = None;
        let outcome = self.session.save_now();
        if self.session.save_path().is_none() {
            self.set_warning("No save file for this review");
            return;
        }
        self.set_info("Progress saved");
        self.report_save(outcome);
    }

    fn quit(&mut self) {
        self.save_now();
        self.should_quit = true;
    }

    fn open_stats_view(&mut self) {
        self.stats_scroll = 0;
        self.view_mode = ViewMode::Stats;
    }

    /// Statistics for the current review state.
    pub fn statistics(&self) -> Statistics {
        Statistics::compute(self.session.dataset(), self.session.reviews())
    }

    // ========== Export ==========

    fn export_results(&mut self, sort: ExportSort) {
        let outcome = self.session.save_draft();
        self.report_save(outcome);

        let path = self
            .export_dir
            .join(export::default_results_file_name(sort, Local::now()));
        match export::write_results(&path, self.session.dataset(), self.session.reviews(), sort) {
            Ok(rows) => {
                self.set_info(format!("Exported {} reviews to {}", rows, path.display()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Results export failed");
                self.set_error(format!("Export failed: {}", e));
            }
        }
    }

    fn export_statistics(&mut self) {
        let path = self
            .export_dir
            .join(export::default_statistics_file_name(Local::now()));
        let stats = self.statistics();
        match export::write_statistics(&path, &stats) {
            Ok(rows) => {
                self.set_info(format!(
                    "Exported statistics for {} judges to {}",
                    rows,
                    path.display()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Statistics export failed");
                self.set_error(format!("Export failed: {}", e));
            }
        }
    }
}
