use super::*;

use metajudge_core::stats::{LevelCounts, Statistics};

pub(super) fn render_stats_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let stats = app.statistics();

    // Layout: header, summary, per-judge table, status, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Length(9), // Summary
        Constraint::Min(5),    // Judges
        Constraint::Length(1), // Status
        Constraint::Length(1), // Footer
    ])
    .split(area);

    let title = Line::from(Span::styled(
        " Metajudge  Review Statistics",
        Style::default().fg(Color::Cyan).bold(),
    ));
    render_header(frame, app, title, chunks[0]);
    render_summary(frame, &stats, chunks[1]);
    render_judge_table(frame, app, &stats, chunks[2]);
    render_status_line(frame, app, chunks[3]);

    let footer = key_hints(&[
        ("Esc", "back"),
        ("j/k", "scroll"),
        ("x", "export results"),
        ("X", "export statistics"),
    ]);
    frame.render_widget(Paragraph::new(footer), chunks[4]);
}

fn level_line(label: &'static str, level: IssueLevel, counts: &LevelCounts) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(issue_color(level))),
        Span::raw(format!(
            "{} ({})",
            counts.get(level),
            format_percent(counts.percent(level))
        )),
    ])
}

fn render_summary(frame: &mut Frame, stats: &Statistics, area: Rect) {
    let summary = &stats.summary;
    let label = Style::default().fg(LABEL_COLOR);

    let lines = vec![
        Line::from(vec![
            Span::styled("Completed reviews:  ", label),
            Span::raw(format!(
                "{} / {} ({})",
                summary.completed,
                summary.possible,
                format_percent(summary.completion_percent())
            )),
        ]),
        Line::from(vec![
            Span::styled("Insights reviewed:  ", label),
            Span::raw(format!(
                "{} / {}",
                summary.insights_reviewed, summary.total_insights
            )),
        ]),
        Line::raw(""),
        level_line("No issues:          ", IssueLevel::NoIssues, &summary.levels),
        level_line("Minor issues:       ", IssueLevel::MinorIssues, &summary.levels),
        level_line("Major issues:       ", IssueLevel::MajorIssues, &summary.levels),
        Line::from(vec![
            Span::styled("Overall issue rate: ", label),
            Span::styled(
                format_percent(summary.levels.issue_rate()),
                Style::default().bold(),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(panel_block(" Summary ".to_string(), BORDER_INSIGHT));
    frame.render_widget(paragraph, area);
}

fn render_judge_table(frame: &mut Frame, app: &mut App, stats: &Statistics, area: Rect) {
    let block = panel_block(" Judges by Issue Rate ".to_string(), BORDER_JUDGE);

    if stats.is_empty() {
        let empty_msg = Paragraph::new("No reviews completed yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty_msg, area);
        return;
    }

    // Clamp scroll offset
    let max_scroll = stats.judges.len().saturating_sub(1);
    if app.stats_scroll > max_scroll {
        app.stats_scroll = max_scroll;
    }

    let header_cells = ["Judge", "Reviews", "No Issues", "Minor", "Major", "Issue Rate"]
        .into_iter()
        .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).bold()));
    let header = Row::new(header_cells).height(1);

    let rows = stats.judges.iter().skip(app.stats_scroll).map(|judge| {
        if judge.total() == 0 {
            return Row::new([
                Cell::from(judge.category.title()),
                Cell::from("0"),
                Cell::from("not reviewed").style(Style::default().fg(Color::DarkGray)),
            ]);
        }
        let levels = &judge.levels;
        let cell = |level: IssueLevel| {
            Cell::from(format!(
                "{} ({})",
                levels.get(level),
                format_percent(levels.percent(level))
            ))
        };
        Row::new([
            Cell::from(judge.category.title()),
            Cell::from(judge.total().to_string()),
            cell(IssueLevel::NoIssues),
            cell(IssueLevel::MinorIssues),
            cell(IssueLevel::MajorIssues),
            Cell::from(format_percent(judge.issue_rate()))
                .style(Style::default().fg(rate_color(judge.issue_rate()))),
        ])
    });

    let widths = [
        Constraint::Fill(1),    // Judge
        Constraint::Length(8),  // Reviews
        Constraint::Length(14), // No issues
        Constraint::Length(14), // Minor
        Constraint::Length(14), // Major
        Constraint::Length(11), // Issue rate
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn rate_color(rate: f64) -> Color {
    if rate >= 50.0 {
        Color::Red
    } else if rate >= 20.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{key, test_app};
    use crossterm::event::KeyCode;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    #[test]
    fn test_render_stats_view() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.handle_key(key(KeyCode::Char('1')));
        app.handle_key(key(KeyCode::Char('s')));

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render(frame, &mut app)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(screen.contains("Review Statistics"));
        assert!(screen.contains("1 / 4 (25.0%)"));
        assert!(screen.contains("Factuality"));
        // Unreviewed judges stay in the table
        assert!(screen.contains("Tone"));
        assert!(screen.contains("not reviewed"));
    }

    #[test]
    fn test_rate_color() {
        assert_eq!(rate_color(75.0), Color::Red);
        assert_eq!(rate_color(20.0), Color::Yellow);
        assert_eq!(rate_color(0.0), Color::Green);
    }
}
