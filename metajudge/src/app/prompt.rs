use super::*;

impl App {
    // ========== Prompt Methods ==========

    /// Open a status bar prompt.
    pub(super) fn open_prompt(&mut self, kind: PromptKind) {
        self.prompt_input.clear();
        self.input_mode = InputMode::Prompt(kind);
        if kind == PromptKind::ExportSort {
            self.set_info("Sort export by (i)nsight or (j)udge? Esc to cancel");
        }
    }

    /// Handle keyboard input while a prompt is open.
    pub(super) fn handle_prompt_key(&mut self, kind: PromptKind, key: KeyEvent) {
        if kind == PromptKind::ExportSort {
            match key.code {
                KeyCode::Char('i') => {
                    self.input_mode = InputMode::Normal;
                    self.export_results(ExportSort::Insight);
                }
                KeyCode::Char('j') => {
                    self.input_mode = InputMode::Normal;
                    self.export_results(ExportSort::Judge);
                }
                KeyCode::Esc => {
                    self.input_mode = InputMode::Normal;
                    self.status = None;
                }
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.prompt_input.clear();
            }
            KeyCode::Enter => {
                self.submit_prompt(kind);
            }
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            KeyCode::Char(c) => {
                let numeric = matches!(kind, PromptKind::JumpInsight | PromptKind::JumpJudge);
                if !numeric || c.is_ascii_digit() {
                    self.prompt_input.push(c);
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind) {
        let input = std::mem::take(&mut self.prompt_input);
        let input = input.trim();
        self.input_mode = InputMode::Normal;

        match kind {
            PromptKind::JumpInsight | PromptKind::JumpJudge => {
                let Ok(number) = input.parse::<usize>() else {
                    self.set_error("Please enter a number");
                    return;
                };
                let result = if kind == PromptKind::JumpInsight {
                    self.session.jump_to_insight(number)
                } else {
                    self.session.jump_to_judge(number)
                };
                match result {
                    Ok(outcome) => self.after_move(outcome),
                    Err(e) => self.set_error(e.to_string()),
                }
            }
            PromptKind::Query => {
                self.status = None;
                if input.is_empty() {
                    self.search.clear();
                } else {
                    self.search.search(input, &self.workout_history);
                    self.scroll_to_current_match();
                }
            }
            PromptKind::ExportSort => {}
        }
    }
}

/// Text shown before the prompt input.
pub fn prompt_label(kind: PromptKind) -> &'static str {
    match kind {
        PromptKind::JumpInsight => "Go to insight #",
        PromptKind::JumpJudge => "Go to judge #",
        PromptKind::Query => "Search workout history: ",
        PromptKind::ExportSort => "Sort export by (i)nsight or (j)udge? ",
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{key, test_app, type_text};
    use super::*;
    use metajudge_core::ReviewKey;
    use tempfile::TempDir;

    #[test]
    fn test_jump_prompts() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char(':')));
        assert_eq!(app.input_mode, InputMode::Prompt(PromptKind::JumpInsight));
        type_text(&mut app, "2x");
        assert_eq!(app.prompt_input, "2");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.position(), ReviewKey::new(1, 0));

        app.handle_key(key(KeyCode::Char(';')));
        type_text(&mut app, "2");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.position(), ReviewKey::new(1, 1));

        app.handle_key(key(KeyCode::Char(':')));
        type_text(&mut app, "9");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.session.position(), ReviewKey::new(1, 1));
        let status = app.status.clone().unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert!(status.text.contains("between 1 and 2"), "{}", status.text);
    }

    #[test]
    fn test_query_prompt_searches_history() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.handle_key(key(KeyCode::Char('/')));
        type_text(&mut app, "SQUAT");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.search.occurrences().len(), 1);
        assert_eq!(app.workout_scroll, 1);
        assert_eq!(
            app.search.status_line().as_deref(),
            Some("1/1 matches for 'SQUAT'")
        );

        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Esc));
        assert!(app.search.is_active());

        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.search.is_active());
    }

    #[test]
    fn test_export_prompt_cancel() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Char('x')));
        app.handle_key(key(KeyCode::Char('q')));
        assert_eq!(app.input_mode, InputMode::Prompt(PromptKind::ExportSort));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.should_quit);
    }
}
