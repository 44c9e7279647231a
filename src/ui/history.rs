use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::{app::App, profile::Difficulty, recorder::TrainingRecord};

fn difficulty_color(d: Difficulty) -> Color {
    match d {
        Difficulty::Beginner => Color::Green,
        Difficulty::Intermediate => Color::Yellow,
        Difficulty::Advanced => Color::Red,
    }
}

/// Pure presenter for a single history row
pub fn present_row(record: &TrainingRecord) -> Row<'static> {
    Row::new(vec![
        Cell::from(record.recorded_at.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(record.difficulty.to_string())
            .style(Style::default().fg(difficulty_color(record.difficulty))),
        Cell::from(record.sets_completed.to_string()),
        Cell::from(record.reps_completed.to_string()),
        Cell::from(format!(
            "{}m{:02}s",
            record.total_duration_secs / 60,
            record.total_duration_secs % 60
        )),
        Cell::from(format!("{}s/{}s", record.contract_secs, record.relax_secs)),
    ])
}

pub fn render_history(app: &App, f: &mut Frame) {
    let area = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    let summary = &app.summary;
    let header_text = format!(
        "{} sessions / {} min / streak {}d / this month {}",
        summary.total_sessions,
        summary.total_duration_minutes,
        summary.streak_days,
        summary.monthly_sessions
    );
    let header = Paragraph::new(header_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Training history"));
    f.render_widget(header, chunks[0]);

    if app.history.is_empty() {
        let empty = Paragraph::new("No sessions recorded yet")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::ITALIC));
        f.render_widget(empty, chunks[1]);
    } else {
        let rows: Vec<Row> = app
            .history
            .iter()
            .skip(app.history_scroll)
            .map(present_row)
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(17),
                Constraint::Length(13),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(8),
                Constraint::Min(9),
            ],
        )
        .header(
            Row::new(vec!["When", "Level", "Sets", "Reps", "Time", "Rhythm"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(table, chunks[1]);
    }

    let legend = Paragraph::new("(b)ack / (up down) scroll / (esc)ape")
        .style(Style::default().add_modifier(Modifier::ITALIC));
    f.render_widget(legend, chunks[2]);
}
