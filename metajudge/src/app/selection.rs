use super::*;

use std::ops::Range;

/// Panel whose text can be selected as a search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePanel {
    Insight,
    Reasoning,
}

impl SourcePanel {
    fn other(self) -> Self {
        match self {
            SourcePanel::Insight => SourcePanel::Reasoning,
            SourcePanel::Reasoning => SourcePanel::Insight,
        }
    }
}

/// A word-granular selection over one panel's text.
///
/// The selection spans from the anchor word to the cursor word, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    pub panel: SourcePanel,
    /// Byte ranges of the words in the panel text
    words: Vec<Range<usize>>,
    anchor: usize,
    cursor: usize,
}

impl TextSelection {
    /// Select the first word of `text`; None when there are no words.
    pub fn new(panel: SourcePanel, text: &str) -> Option<Self> {
        let words = word_ranges(text);
        if words.is_empty() {
            return None;
        }
        Some(Self {
            panel,
            words,
            anchor: 0,
            cursor: 0,
        })
    }

    /// Move the cursor one word. With `extend`, the anchor stays put.
    pub fn move_cursor(&mut self, forward: bool, extend: bool) {
        let last = self.words.len() - 1;
        self.cursor = if forward {
            (self.cursor + 1).min(last)
        } else {
            self.cursor.saturating_sub(1)
        };
        if !extend {
            self.anchor = self.cursor;
        }
    }

    /// Byte range of the selected text.
    pub fn byte_range(&self) -> Range<usize> {
        let first = self.anchor.min(self.cursor);
        let last = self.anchor.max(self.cursor);
        self.words[first].start..self.words[last].end
    }

    pub fn selected<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.byte_range()).unwrap_or("")
    }
}

/// Byte ranges of whitespace-separated words.
fn word_ranges(text: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                words.push(s..idx);
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(s..text.len());
    }
    words
}

impl App {
    // ========== Selection Methods ==========

    /// Text of a selectable panel at the current position.
    pub fn panel_text(&self, panel: SourcePanel) -> String {
        let text = match panel {
            SourcePanel::Insight => self.session.current_insight().text.clone(),
            SourcePanel::Reasoning => self
                .session
                .current_judgment()
                .and_then(|j| j.reasoning.clone()),
        };
        text.unwrap_or_default()
    }

    /// Enter selection mode, starting in the judge reasoning.
    pub(super) fn start_selection(&mut self) {
        let selection = [SourcePanel::Reasoning, SourcePanel::Insight]
            .into_iter()
            .find_map(|panel| TextSelection::new(panel, &self.panel_text(panel)));
        match selection {
            Some(selection) => {
                self.selection = Some(selection);
                self.input_mode = InputMode::Selecting;
                self.apply_selection();
            }
            None => self.set_warning("Nothing to select"),
        }
    }

    /// Handle keyboard input in selection mode.
    pub(super) fn handle_selection_key(&mut self, key: KeyEvent) {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.selection = None;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Tab => {
                let Some(current) = self.selection.as_ref().map(|s| s.panel) else {
                    return;
                };
                let other = current.other();
                if let Some(selection) = TextSelection::new(other, &self.panel_text(other)) {
                    self.selection = Some(selection);
                    self.apply_selection();
                }
            }
            KeyCode::Left | KeyCode::Right => {
                if let Some(selection) = self.selection.as_mut() {
                    selection.move_cursor(key.code == KeyCode::Right, extend);
                }
                self.apply_selection();
            }
            _ => {}
        }
    }

    /// Search the workout history for the selected text.
    fn apply_selection(&mut self) {
        let Some(selection) = &self.selection else {
            return;
        };
        let text = self.panel_text(selection.panel);
        let selected = selection.selected(&text).to_string();
        self.status = None;
        self.search.on_selection(&selected, &self.workout_history);
        self.scroll_to_current_match();
    }
}
