//! Ratatui rendering of the board table.
//!
//! Two terminal lines per event (away over home), mirroring the stacked
//! layout of the board: time and rotation numbers on the left, matchup,
//! score cell, then one odds column per sportsbook. Aging tiers map to
//! background colors, winners and won sets to bold.

use chrono::{DateTime, Utc};
use oddsboard::render::{CellValue, RowClass, ScoreCell, SideLine};
use oddsboard::{BoardTable, EventRow, Tier};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::feed::FeedStatus;

const TIME_WIDTH: usize = 9;
const ROT_WIDTH: usize = 6;
const NAME_WIDTH: usize = 24;
const SCORE_WIDTH: usize = 16;
const ODDS_WIDTH: usize = 8;

pub fn ui(
    f: &mut Frame,
    table: &BoardTable,
    status: FeedStatus,
    last_update: Option<DateTime<Utc>>,
    scroll: u16,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    render_status_bar(f, chunks[0], status, last_update);

    let body = Paragraph::new(board_lines(table))
        .block(Block::default().borders(Borders::ALL).title(" Odds Board "))
        .scroll((scroll, 0));
    f.render_widget(body, chunks[1]);
}

fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    status: FeedStatus,
    last_update: Option<DateTime<Utc>>,
) {
    let (symbol, text, color) = match status {
        FeedStatus::Connected => ("●", "CONNECTED", Color::Green),
        FeedStatus::Reconnecting => ("◐", "RECONNECTING", Color::Yellow),
        FeedStatus::Disconnected => ("○", "DISCONNECTED", Color::Red),
    };
    let updated = match last_update {
        Some(at) => format!("  last update {}", at.format("%H:%M:%S")),
        None => String::new(),
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {symbol} {text} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(updated, Style::default().fg(Color::Gray)),
        Span::styled("  q: quit  ↑/↓: scroll", Style::default().fg(Color::DarkGray)),
    ]);
    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

/// Build the whole board as styled lines.
pub fn board_lines(table: &BoardTable) -> Vec<Line<'static>> {
    if let Some(message) = &table.error {
        return vec![Line::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )];
    }
    if table.is_empty() {
        return vec![Line::styled(
            "No game data available.",
            Style::default().fg(Color::DarkGray),
        )];
    }

    let mut lines = Vec::new();
    if table.headers_on_top {
        lines.push(heading_line(&table.columns));
        lines.push(Line::default());
    }
    for group in &table.groups {
        lines.push(Line::styled(
            group.header.clone(),
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan),
        ));
        if !table.headers_on_top {
            lines.push(heading_line(&table.columns));
        }
        for row in &group.rows {
            let (away_line, home_line) = event_lines(row);
            lines.push(away_line);
            lines.push(home_line);
        }
        lines.push(Line::default());
    }
    lines
}

fn heading_line(columns: &[String]) -> Line<'static> {
    let mut text = String::new();
    for (i, column) in columns.iter().enumerate() {
        let width = match i {
            0 => TIME_WIDTH,
            1 => ROT_WIDTH,
            2 => NAME_WIDTH,
            3 => SCORE_WIDTH,
            _ => ODDS_WIDTH,
        };
        text.push_str(&format!("{:<width$}", truncate(column, width)));
    }
    Line::styled(
        text,
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::UNDERLINED),
    )
}

/// The two stacked lines of one event row.
fn event_lines(row: &EventRow) -> (Line<'static>, Line<'static>) {
    let base = row_style(row);

    let (away_score, home_score) = score_texts(&row.score);

    let mut away = vec![
        Span::styled(format!("{:<TIME_WIDTH$}", truncate(&row.time, TIME_WIDTH)), base),
        Span::styled(format!("{:<ROT_WIDTH$}", row.rotation_number), base),
        side_span(&row.away, base),
    ];
    let mut home = vec![
        Span::styled(" ".repeat(TIME_WIDTH), base),
        Span::styled(
            format!("{:<ROT_WIDTH$}", row.rotation_number.saturating_add(1)),
            base,
        ),
        side_span(&row.home, base),
    ];
    // The score column stays SCORE_WIDTH wide whatever its cell count, so
    // the odds columns never shift between row shapes.
    let pad_scores = |values: Vec<CellValue>| {
        let width = SCORE_WIDTH / values.len().max(1);
        values
            .into_iter()
            .map(move |v| padded_cell_span(&v, width, base))
            .collect::<Vec<_>>()
    };
    away.extend(pad_scores(away_score));
    home.extend(pad_scores(home_score));

    for odds in &row.odds {
        let odds_base = if odds.highlighted {
            base.fg(Color::Magenta)
        } else {
            base
        };
        away.push(odds_cell_span(&odds.away, odds_base));
        home.push(odds_cell_span(&odds.home, odds_base));
    }
    (Line::from(away), Line::from(home))
}

fn row_style(row: &EventRow) -> Style {
    let mut style = match row.row_class {
        RowClass::Final => Style::default().fg(Color::DarkGray),
        RowClass::Active => Style::default().fg(Color::White),
        RowClass::Neutral => Style::default().fg(Color::Gray),
    };
    if row.highlighted {
        style = style.bg(Color::Rgb(45, 45, 15));
    }
    style
}

/// Per-side score-cell content, already padded/joined into fixed cells.
fn score_texts(score: &ScoreCell) -> (Vec<CellValue>, Vec<CellValue>) {
    match score {
        ScoreCell::Status(value) => {
            let mut centered = value.clone();
            centered.text = format!("{:^width$}", centered.text, width = SCORE_WIDTH);
            (vec![centered], vec![CellValue::blank()])
        }
        ScoreCell::WinnerText { away, home } => (vec![away.clone()], vec![home.clone()]),
        ScoreCell::Sets { away, home } => {
            let join = |slots: &[CellValue; 5]| {
                let mut merged = CellValue::text(
                    slots
                        .iter()
                        .map(|s| format!("{:>3}", s.text))
                        .collect::<String>(),
                );
                merged.strong = slots.iter().any(|s| s.strong);
                merged.tier = slots.iter().filter_map(|s| s.tier).max();
                merged
            };
            (vec![join(away)], vec![join(home)])
        }
        ScoreCell::Grid {
            away,
            home,
            status1,
            status2,
        } => (
            vec![away.clone(), status1.clone()],
            vec![home.clone(), status2.clone()],
        ),
    }
}

fn side_span(side: &SideLine, base: Style) -> Span<'static> {
    let mut label = side.name.clone();
    if let Some(pitcher) = &side.pitcher {
        label.push_str(&format!(" ({pitcher})"));
    }
    let mut style = base;
    if side.winner {
        style = style.add_modifier(Modifier::BOLD).fg(Color::Green);
    }
    Span::styled(format!("{:<NAME_WIDTH$}", truncate(&label, NAME_WIDTH)), style)
}

fn padded_cell_span(value: &CellValue, width: usize, base: Style) -> Span<'static> {
    styled_cell(format!("{:<width$}", truncate(&value.text, width)), value, base)
}

fn odds_cell_span(value: &CellValue, base: Style) -> Span<'static> {
    styled_cell(
        format!("{:>width$} ", truncate(&value.text, ODDS_WIDTH - 1), width = ODDS_WIDTH - 1),
        value,
        base,
    )
}

fn styled_cell(text: String, value: &CellValue, base: Style) -> Span<'static> {
    let mut style = base;
    if let Some(color) = tier_color(value.tier) {
        style = style.bg(color).fg(Color::Black);
    }
    if value.strong {
        style = style.add_modifier(Modifier::BOLD);
    }
    Span::styled(text, style)
}

fn tier_color(tier: Option<Tier>) -> Option<Color> {
    match tier? {
        Tier::Recent => Some(Color::Green),
        Tier::Medium => Some(Color::Yellow),
        Tier::Old => Some(Color::Rgb(120, 120, 120)),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        text.chars().take(width.saturating_sub(1)).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_board_renders_message() {
        let table = BoardTable::from_error("Error processing game data: bad shape");
        let lines = board_lines(&table);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].spans[0].content.contains("bad shape"));
    }

    #[test]
    fn test_empty_board_placeholder() {
        let lines = board_lines(&BoardTable::default());
        assert_eq!(lines[0].spans[0].content, "No game data available.");
    }

    #[test]
    fn test_tier_colors() {
        assert_eq!(tier_color(Some(Tier::Recent)), Some(Color::Green));
        assert_eq!(tier_color(None), None);
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a rather long name", 8), "a rathe…");
    }
}
