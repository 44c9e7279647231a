pub mod history;
pub mod screen;

use std::time::Duration;

use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs, Widget, Wrap},
    Frame,
};
use time_humanize::{Accuracy, HumanTime, Tense};
use unicode_width::UnicodeWidthStr;
use webbrowser::Browser;

use crate::{
    app::{App, Notice},
    profile::Difficulty,
    trainer::Phase,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Draw whichever screen is active
pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.screen).render(app, f);
}

fn phase_color(app: &App) -> Color {
    if app.trainer.is_inter_set_pause() {
        return Color::Yellow;
    }
    match app.trainer.phase() {
        Phase::Ready => Color::Blue,
        Phase::Contract => Color::Red,
        Phase::Relax => Color::Green,
    }
}

fn phase_text(app: &App) -> (String, String) {
    let trainer = &app.trainer;
    let profile = trainer.profile();

    if trainer.is_inter_set_pause() {
        return (
            "Rest".to_string(),
            format!("set {} starts shortly", trainer.current_set()),
        );
    }

    match (trainer.phase(), trainer.is_running()) {
        (Phase::Ready, _) => (
            format!("Start {}", trainer.difficulty()),
            format!(
                "{} reps x {} sets, ~{}min",
                profile.reps_per_set,
                profile.sets_to_complete(),
                profile.total_time_minutes
            ),
        ),
        (phase, true) => (
            phase.label().to_string(),
            format!("{:.1}s", trainer.remaining_seconds()),
        ),
        (phase, false) => (
            "Paused".to_string(),
            format!("{} - {:.1}s left", phase.label(), trainer.remaining_seconds()),
        ),
    }
}

/// "5 minutes ago" style rendering of the last session
pub fn last_trained_text(app: &App) -> String {
    match app.summary.last_session_at {
        Some(at) => {
            let secs = (Local::now() - at).num_seconds().max(0) as u64;
            format!(
                "last trained {}",
                HumanTime::from(Duration::from_secs(secs)).to_text_en(Accuracy::Rough, Tense::Past)
            )
        }
        None => "no sessions yet".to_string(),
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let trainer = &self.trainer;
        let profile = trainer.profile();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // header
                Constraint::Length(3), // difficulty tabs
                Constraint::Length(2), // description
                Constraint::Min(5),    // phase block
                Constraint::Length(1), // phase gauge
                Constraint::Length(1), // set / rep counters
                Constraint::Length(1), // padding
                Constraint::Length(1), // progression gauge
                Constraint::Length(1), // stats
                Constraint::Length(1), // notice
                Constraint::Length(1), // legend
            ])
            .split(area);

        let who = match self.user() {
            Some(user) => user.short(),
            None => "no wallet".to_string(),
        };
        Paragraph::new(Line::from(vec![
            Span::styled("PEED", bold_style.fg(Color::Magenta)),
            Span::raw("  "),
            Span::styled(who, dim_style),
        ]))
        .render(chunks[0], buf);

        let titles: Vec<Line> = Difficulty::ALL
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let p = d.profile();
                Line::from(format!(
                    "{} {}  {}s/{}s",
                    i + 1,
                    d,
                    p.contract_secs,
                    p.relax_secs
                ))
            })
            .collect();
        let selected = Difficulty::ALL
            .iter()
            .position(|d| *d == trainer.difficulty())
            .unwrap_or(0);
        Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(profile.name))
            .highlight_style(bold_style.fg(Color::Cyan))
            .render(chunks[1], buf);

        Paragraph::new(profile.description)
            .style(italic_style)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        let color = phase_color(self);
        let (title, detail) = phase_text(self);
        let block_area = chunks[3];
        let pad = block_area.height.saturating_sub(4) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::raw("")).collect();
        lines.push(Line::from(Span::styled(title, bold_style)));
        lines.push(Line::from(Span::raw(detail)));
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::White).bg(color))
            .block(Block::default().borders(Borders::ALL))
            .render(block_area, buf);

        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .percent(trainer.progress_percent().round() as u16)
            .label(format!("{:.0}%", trainer.progress_percent()))
            .render(chunks[4], buf);

        let counters = if trainer.phase() == Phase::Ready && !trainer.is_inter_set_pause() {
            format!("{} reps per set, {} sets", profile.reps_per_set, profile.sets_to_complete())
        } else {
            format!(
                "Set {}/{}   Rep {}/{}",
                trainer.current_set(),
                profile.sets_to_complete(),
                trainer.current_rep(),
                profile.reps_per_set
            )
        };
        Paragraph::new(Span::styled(counters, bold_style))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        let progression = &self.progression;
        let progression_label = match trainer.difficulty().next() {
            Some(next) if progression.can_progress => format!("{next} unlocked"),
            Some(next) => format!(
                "{}/{} sessions to {} ({} weeks)",
                progression.completed,
                profile.progression_threshold,
                next,
                profile.progression_weeks
            ),
            None => format!("{} sessions at advanced", progression.completed),
        };
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Magenta))
            .percent(progression.progress_percent.round() as u16)
            .label(progression_label)
            .render(chunks[7], buf);

        let summary = &self.summary;
        let stats = format!(
            "today {}   week {}   total {} ({} min)   streak {}d   {}",
            summary.today_sessions,
            summary.weekly_sessions,
            summary.total_sessions,
            summary.total_duration_minutes,
            summary.streak_days,
            last_trained_text(self)
        );
        let stats_alignment = if stats.width() <= chunks[8].width as usize {
            Alignment::Center
        } else {
            Alignment::Left
        };
        Paragraph::new(Span::styled(stats, dim_style))
            .alignment(stats_alignment)
            .render(chunks[8], buf);

        if let Some(notice) = &self.notice {
            let style = match notice {
                Notice::Info(_) => Style::default().fg(Color::Cyan),
                Notice::Error(_) => bold_style.fg(Color::Red),
            };
            Paragraph::new(Span::styled(notice.text().to_string(), style))
                .alignment(Alignment::Center)
                .render(chunks[9], buf);
        }

        let share = self.trainer.last_completed().is_some() && Browser::is_available();
        let legend = if share {
            "(space) start/pause / (r)eset / (1-3 <- ->) level / (h)istory / (t)weet / (esc)ape"
        } else {
            "(space) start/pause / (r)eset / (1-3 <- ->) level / (h)istory / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[10], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{StaticIdentity, UserId};
    use crate::recorder::TrainingDb;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_training_screen_renders_ready_state() {
        let identity = StaticIdentity::new(Some(
            UserId::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap(),
        ));
        let app = App::new(
            Difficulty::Beginner,
            identity,
            TrainingDb::open_in_memory().unwrap(),
        );
        let mut terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Start beginner"));
        assert!(text.contains("7xKX...gAsU"));
        assert!(text.contains("no sessions yet"));
    }

    #[test]
    fn test_training_screen_renders_running_phase() {
        let identity = StaticIdentity::new(Some(
            UserId::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU").unwrap(),
        ));
        let mut app = App::new(
            Difficulty::Intermediate,
            identity,
            TrainingDb::open_in_memory().unwrap(),
        );
        app.trainer.start().unwrap();
        let mut terminal = Terminal::new(TestBackend::new(110, 30)).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Contract"));
        assert!(text.contains("Set 1/4"));
    }
}
