use super::*;

pub(super) fn render_review_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: header, panels, assessment, status, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Insight/judge | workout history
        Constraint::Length(7), // Assessment
        Constraint::Length(1), // Status
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_header(frame, app, review_title(app), chunks[0]);

    let body = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    let left = Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(body[0]);

    render_insight_panel(frame, app, left[0]);
    render_judge_panel(frame, app, left[1]);
    render_workout_history(frame, app, body[1]);
    render_assessment(frame, app, chunks[2]);
    render_status_line(frame, app, chunks[3]);
    render_review_footer(frame, app, chunks[4]);
}

/// "Metajudge  Insight 2/40  Judge 3/7: Personalization  PENDING"
fn review_title(app: &App) -> Line<'static> {
    let session = &app.session;
    let dataset = session.dataset();
    let position = session.position();
    let status = session.status();

    Line::from(vec![
        Span::styled(" Metajudge  ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("Insight ", Style::default().fg(LABEL_COLOR)),
        Span::raw(format!(
            "{}/{}  ",
            position.insight + 1,
            dataset.total_insights()
        )),
        Span::styled("Judge ", Style::default().fg(LABEL_COLOR)),
        Span::raw(format!(
            "{}/{}: {}  ",
            position.judge + 1,
            dataset.total_judges(),
            session.current_category().title()
        )),
        Span::styled(
            status.as_str(),
            Style::default().fg(status_color(status)).bold(),
        ),
    ])
}

/// Panel text, with the active selection (if in this panel) highlighted.
fn selectable_text(app: &App, panel: SourcePanel, placeholder: &'static str) -> Vec<Line<'static>> {
    let text = app.panel_text(panel);
    if text.is_empty() {
        return vec![Line::from(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let selected = app
        .selection
        .as_ref()
        .filter(|s| s.panel == panel)
        .map(|s| s.byte_range());

    let mut lines = Vec::new();
    let mut offset = 0;
    for raw in text.split('\n') {
        let line_range = offset..offset + raw.len();
        offset = line_range.end + 1;

        let Some(sel) = selected
            .as_ref()
            .filter(|sel| sel.start < line_range.end && sel.end > line_range.start)
        else {
            lines.push(Line::raw(raw.to_string()));
            continue;
        };

        let start = sel.start.max(line_range.start) - line_range.start;
        let end = sel.end.min(line_range.end) - line_range.start;
        lines.push(Line::from(vec![
            Span::raw(raw[..start].to_string()),
            Span::styled(
                raw[start..end].to_string(),
                Style::default().add_modifier(Modifier::REVERSED),
            ),
            Span::raw(raw[end..].to_string()),
        ]));
    }
    lines
}

fn render_insight_panel(frame: &mut Frame, app: &App, area: Rect) {
    let insight = app.session.current_insight();

    let mut lines = vec![
        Line::from(vec![
            Span::styled("User: ", Style::default().fg(LABEL_COLOR)),
            Span::raw(insight.email.clone().unwrap_or_else(|| "N/A".to_string())),
        ]),
        Line::from(vec![
            Span::styled("Goal: ", Style::default().fg(LABEL_COLOR)),
            Span::raw(insight.goal.clone().unwrap_or_else(|| "N/A".to_string())),
        ]),
        Line::raw(""),
    ];
    lines.extend(selectable_text(app, SourcePanel::Insight, "No insight text"));

    let paragraph = Paragraph::new(lines)
        .block(panel_block(
            format!(" Insight #{} ", insight.number()),
            selection_border(app, SourcePanel::Insight, BORDER_INSIGHT),
        ))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_judge_panel(frame: &mut Frame, app: &App, area: Rect) {
    let score = app
        .session
        .current_judgment()
        .and_then(|j| j.score.clone())
        .unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Score: ", Style::default().fg(LABEL_COLOR)),
            Span::styled(score, Style::default().bold()),
        ]),
        Line::raw(""),
    ];
    lines.extend(selectable_text(app, SourcePanel::Reasoning, "No reasoning provided"));

    let paragraph = Paragraph::new(lines)
        .block(panel_block(
            format!(" Judge: {} ", app.session.current_category().title()),
            selection_border(app, SourcePanel::Reasoning, BORDER_JUDGE),
        ))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Highlight the border of the panel being selected in.
fn selection_border(app: &App, panel: SourcePanel, color: Color) -> Color {
    match &app.selection {
        Some(selection) if selection.panel == panel => Color::Yellow,
        _ => color,
    }
}

fn render_workout_history(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines = history_lines(&app.workout_history, &app.search);

    // Clamp scroll offset
    let max_scroll = lines.len().saturating_sub(1);
    if app.workout_scroll > max_scroll {
        app.workout_scroll = max_scroll;
    }

    let title = match app.search.status_line() {
        Some(status) => format!(" Workout History ({}) ", status),
        None => " Workout History ".to_string(),
    };

    let paragraph = Paragraph::new(lines)
        .block(panel_block(title, BORDER_HISTORY))
        .wrap(Wrap { trim: false })
        .scroll((app.workout_scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

fn render_assessment(frame: &mut Frame, app: &App, area: Rect) {
    let draft = app.session.draft();
    let editing = app.input_mode == InputMode::Editing;

    let mut choices = Vec::new();
    for (idx, level) in IssueLevel::ALL.iter().enumerate() {
        let chosen = draft.issue_level == Some(*level);
        let marker = if chosen { "(•)" } else { "( )" };
        let style = if chosen {
            Style::default().fg(issue_color(*level)).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        choices.push(Span::styled(format!("{} ", idx + 1), Style::default().fg(Color::Yellow)));
        choices.push(Span::styled(format!("{} {}    ", marker, level), style));
    }

    let mut lines = vec![Line::from(choices)];
    let mut explanation: Vec<Line> = draft
        .explanation
        .split('\n')
        .map(|l| Line::raw(l.to_string()))
        .collect();
    if editing {
        if let Some(last) = explanation.last_mut() {
            last.push_span(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
    } else if draft.explanation.is_empty() {
        explanation = vec![Line::from(Span::styled(
            "Press e to write an explanation",
            Style::default().fg(Color::DarkGray),
        ))];
    }
    lines.extend(explanation);

    let (title, color) = if editing {
        (" Explanation (Esc to finish) ".to_string(), Color::Yellow)
    } else {
        (" Assessment ".to_string(), BORDER_ASSESSMENT)
    };

    let paragraph = Paragraph::new(lines)
        .block(panel_block(title, color))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_review_footer(frame: &mut Frame, app: &App, area: Rect) {
    let footer = match app.input_mode {
        InputMode::Editing => key_hints(&[
            ("Esc", "finish"),
            ("Enter", "new line"),
            ("Backspace", "delete"),
        ]),
        InputMode::Selecting => key_hints(&[
            ("←/→", "move"),
            ("Shift+←/→", "extend"),
            ("Tab", "switch panel"),
            ("Enter/Esc", "done"),
        ]),
        InputMode::Prompt(_) => key_hints(&[("Enter", "confirm"), ("Esc", "cancel")]),
        InputMode::Normal => key_hints(&[
            ("1/2/3", "rate"),
            ("n/p", "review"),
            ("^←/^→", "insight"),
            ("^↑/^↓", "judge"),
            (":/;", "jump"),
            ("v", "select"),
            ("/", "search"),
            ("a/d", "match"),
            ("e", "explain"),
            ("s", "stats"),
            ("x/X", "export"),
            ("w", "save"),
            ("q", "quit"),
        ]),
    };

    frame.render_widget(Paragraph::new(footer), area);
}
