//! UI rendering for the TUI.

use metajudge_core::format::{autosave_label, format_percent};
use metajudge_core::search::{highlight_segments, SegmentKind};
use metajudge_core::{HighlightSearch, IssueLevel, ReviewStatus};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{prompt_label, App, InputMode, SourcePanel, StatusKind, ViewMode};

mod review;
mod stats;

// ========== Colors ==========

/// Border color for the insight panel
const BORDER_INSIGHT: Color = Color::Rgb(0, 150, 150);
/// Border color for the judge panel
const BORDER_JUDGE: Color = Color::Rgb(180, 100, 180);
/// Border color for the workout history panel
const BORDER_HISTORY: Color = Color::Rgb(80, 160, 80);
/// Border color for the assessment panel
const BORDER_ASSESSMENT: Color = Color::Rgb(100, 140, 200);
/// Label color for field names
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Background of search matches
const MATCH_BG: Color = Color::Rgb(220, 180, 0);
/// Background of the current search match
const CURRENT_MATCH_BG: Color = Color::Rgb(255, 110, 60);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Review => review::render_review_view(frame, app),
        ViewMode::Stats => stats::render_stats_view(frame, app),
    }
}

/// Render the header bar: title on the left, progress on the right.
fn render_header(frame: &mut Frame, app: &App, title: Line, area: Rect) {
    let chunks = Layout::horizontal([Constraint::Min(20), Constraint::Length(44)]).split(area);

    let header = Paragraph::new(title).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let reviews = app.session.reviews().len();
    let possible = app.session.dataset().total_reviews();
    let percent = if possible == 0 {
        0.0
    } else {
        reviews as f64 / possible as f64 * 100.0
    };
    let progress = Line::from(vec![
        Span::styled(
            format!("{}/{} reviewed ({})", reviews, possible, format_percent(percent)),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  "),
        Span::styled(
            autosave_label(app.session.last_saved()),
            Style::default().fg(Color::DarkGray),
        ),
    ])
    .right_aligned();
    let progress = Paragraph::new(progress).block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(progress, chunks[1]);
}

/// Render the status bar: prompt, last message, or search state.
fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let InputMode::Prompt(kind) = app.input_mode {
        Line::from(vec![
            Span::styled(format!(" {}", prompt_label(kind)), Style::default().fg(Color::Cyan)),
            Span::raw(app.prompt_input.as_str()),
            Span::styled("█", Style::default().fg(Color::Cyan)),
        ])
    } else if let Some(status) = &app.status {
        let color = match status.kind {
            StatusKind::Info => Color::Green,
            StatusKind::Warning => Color::Yellow,
            StatusKind::Error => Color::Red,
        };
        Line::from(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color),
        ))
    } else if let Some(search) = app.search.status_line() {
        Line::from(Span::styled(
            format!(" {}", search),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::raw("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Build a footer line from (key, action) pairs.
fn key_hints(hints: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (idx, (key, action)) in hints.iter().enumerate() {
        let key = if idx == 0 {
            format!(" {}", key)
        } else {
            key.to_string()
        };
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}  ", action)));
    }
    Line::from(spans)
}

/// Rounded block with a colored border and title.
fn panel_block(title: String, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).bold())
}

/// Style for one piece of the highlighted workout history.
fn segment_style(kind: SegmentKind) -> Style {
    match kind {
        SegmentKind::Plain => Style::default(),
        SegmentKind::Match => Style::default().bg(MATCH_BG).fg(Color::Black),
        SegmentKind::CurrentMatch => Style::default()
            .bg(CURRENT_MATCH_BG)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    }
}

/// Split the highlighted workout history into display lines.
fn history_lines<'a>(document: &'a str, search: &HighlightSearch) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'a>> = Vec::new();

    for (text, kind) in highlight_segments(document, search.occurrences(), search.current_index()) {
        let style = segment_style(kind);
        let mut parts = text.split('\n');
        if let Some(first) = parts.next().filter(|p| !p.is_empty()) {
            current.push(Span::styled(first, style));
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)));
            if !part.is_empty() {
                current.push(Span::styled(part, style));
            }
        }
    }
    lines.push(Line::from(current));
    lines
}

/// Color for an issue level.
fn issue_color(level: IssueLevel) -> Color {
    match level {
        IssueLevel::NoIssues => Color::Green,
        IssueLevel::MinorIssues => Color::Yellow,
        IssueLevel::MajorIssues => Color::Red,
    }
}

fn status_color(status: ReviewStatus) -> Color {
    match status {
        ReviewStatus::Reviewed => Color::Green,
        ReviewStatus::Pending => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_history_lines_split_matches_across_newlines() {
        let doc = "Mon: bench press\nThu: Bench\npress";
        let mut search = HighlightSearch::new();
        search.search("bench press", doc);
        assert_eq!(search.occurrences().len(), 1);

        let lines = history_lines(doc, &search);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, vec!["Mon: bench press", "Thu: Bench", "press"]);
        assert_eq!(lines[0].spans[1].style, segment_style(SegmentKind::CurrentMatch));
    }

    #[test]
    fn test_history_lines_plain_document() {
        let doc = "squat\n\ndeadlift";
        let search = HighlightSearch::new();
        let texts: Vec<String> = history_lines(doc, &search).iter().map(line_text).collect();
        assert_eq!(texts, vec!["squat", "", "deadlift"]);
    }

    #[test]
    fn test_key_hints() {
        let line = key_hints(&[("q", "quit"), ("w", "save")]);
        assert_eq!(line_text(&line), " q quit  w save  ");
    }
}
