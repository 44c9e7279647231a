use std::time::Duration;

use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::error::TrainerError;
use crate::identity::{IdentityProvider, StaticIdentity, UserId};
use crate::profile::Difficulty;
use crate::progression::ProgressionInfo;
use crate::recorder::{TrainingDb, TrainingRecord, TrainingSummary};
use crate::trainer::{RecordOutcome, Trainer, TrainerEvent};

const HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Training,
    History,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Error(s) => s,
        }
    }
}

/// Terminal application state around one trainer
pub struct App {
    pub trainer: Trainer<StaticIdentity, TrainingDb>,
    pub screen: Screen,
    pub notice: Option<Notice>,
    pub summary: TrainingSummary,
    pub progression: ProgressionInfo,
    pub history: Vec<TrainingRecord>,
    pub history_scroll: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(difficulty: Difficulty, identity: StaticIdentity, db: TrainingDb) -> Self {
        let mut app = Self {
            trainer: Trainer::new(difficulty, identity, db),
            screen: Screen::Training,
            notice: None,
            summary: TrainingSummary::default(),
            progression: ProgressionInfo::new(difficulty, 0),
            history: Vec::new(),
            history_scroll: 0,
            should_quit: false,
        };
        app.refresh_stats();
        if app.user().is_none() {
            app.notice = Some(Notice::Info(
                "No wallet connected: run with --wallet <address> to train".to_string(),
            ));
        }
        app
    }

    pub fn user(&self) -> Option<UserId> {
        self.trainer.identity().current_user()
    }

    /// Reload summary and progression from the training database
    pub fn refresh_stats(&mut self) {
        let difficulty = self.trainer.difficulty();
        let Some(user) = self.user() else {
            self.summary = TrainingSummary::default();
            self.progression = ProgressionInfo::new(difficulty, 0);
            return;
        };

        match self.trainer.recorder().summary(&user, Local::now().date_naive()) {
            Ok(summary) => {
                self.progression =
                    ProgressionInfo::new(difficulty, summary.sessions_for(difficulty));
                self.summary = summary;
            }
            Err(err) => {
                warn!(error = %err, "failed to load training summary");
                self.notice = Some(Notice::Error(format!("Could not load stats: {err}")));
            }
        }
    }

    fn load_history(&mut self) {
        let Some(user) = self.user() else {
            self.history.clear();
            return;
        };
        match self.trainer.recorder().history(&user, None, HISTORY_LIMIT) {
            Ok(history) => self.history = history,
            Err(err) => {
                warn!(error = %err, "failed to load training history");
                self.notice = Some(Notice::Error(format!("Could not load history: {err}")));
            }
        }
        self.history_scroll = 0;
    }

    /// Feed one clock tick into the trainer and react to what happened
    pub fn on_tick(&mut self, delta: Duration) -> Option<TrainerEvent> {
        let event = self.trainer.advance(delta)?;
        match &event {
            TrainerEvent::SetCompleted { sets_completed } => {
                self.notice = Some(Notice::Info(format!(
                    "Set {}/{} done, next set in 2s",
                    sets_completed,
                    self.trainer.profile().sets_to_complete()
                )));
            }
            TrainerEvent::InterSetResumed => {
                self.notice = None;
            }
            TrainerEvent::SessionCompleted { session, outcome } => {
                self.notice = Some(match outcome {
                    RecordOutcome::Recorded { .. } => Notice::Info(format!(
                        "Session complete: {} sets, {} reps. Press t to share",
                        session.sets_completed, session.reps_completed
                    )),
                    RecordOutcome::Failed(err) => Notice::Error(format!(
                        "Session complete but saving failed: {err}"
                    )),
                });
                self.refresh_stats();
                if let Some(suggestion) = self.progression.suggestion() {
                    if matches!(outcome, RecordOutcome::Recorded { .. }) {
                        self.notice = Some(Notice::Info(suggestion));
                    }
                }
            }
            TrainerEvent::PhaseChanged { .. } => {}
        }
        Some(event)
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Training => self.on_training_key(key),
            Screen::History => self.on_history_key(key),
        }
    }

    fn on_training_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => {
                let result = self.trainer.toggle();
                self.apply(result);
            }
            KeyCode::Char('r') => {
                self.trainer.reset();
                self.notice = None;
            }
            KeyCode::Left => self.select(self.trainer.difficulty().cycle_prev()),
            KeyCode::Right => self.select(self.trainer.difficulty().cycle_next()),
            KeyCode::Char(c @ '1'..='3') => {
                let idx = c as usize - '1' as usize;
                self.select(Difficulty::ALL[idx]);
            }
            KeyCode::Char('h') => {
                self.load_history();
                self.screen = Screen::History;
            }
            _ => {}
        }
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') | KeyCode::Char('h') | KeyCode::Backspace => {
                self.screen = Screen::Training;
            }
            KeyCode::Up => {
                self.history_scroll = self.history_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.history_scroll + 1 < self.history.len() {
                    self.history_scroll += 1;
                }
            }
            KeyCode::Home => self.history_scroll = 0,
            _ => {}
        }
    }

    fn select(&mut self, difficulty: Difficulty) {
        let result = self.trainer.select_difficulty(difficulty);
        if result.is_ok() {
            self.notice = None;
            self.refresh_stats();
        }
        self.apply(result);
    }

    fn apply(&mut self, result: Result<(), TrainerError>) {
        if let Err(err) = result {
            self.notice = Some(Notice::Error(match err {
                TrainerError::IdentityRequired => {
                    format!("{err}: run with --wallet <address>")
                }
                TrainerError::DifficultyLocked(_) => err.to_string(),
            }));
        }
    }

    /// X/Twitter intent link for the last completed session
    pub fn share_url(&self) -> Option<String> {
        let session = self.trainer.last_completed()?;
        let text = format!(
            "Finished a {} PEED session: {} sets / {} reps in {}m{:02}s. Streak: {} days",
            session.difficulty,
            session.sets_completed,
            session.reps_completed,
            session.total_duration_secs / 60,
            session.total_duration_secs % 60,
            self.summary.streak_days,
        );
        Some(format!(
            "https://twitter.com/intent/tweet?text={}",
            encode_component(&text)
        ))
    }

    pub fn shutdown(&mut self) {
        self.trainer.shutdown();
    }
}

/// Percent-encode everything outside the URI unreserved set
fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}
