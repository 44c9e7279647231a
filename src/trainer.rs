use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::TrainerError;
use crate::identity::{IdentityProvider, UserId};
use crate::profile::{Difficulty, DifficultyProfile};
use crate::recorder::SessionRecorder;

/// Rest between two sets before the next contraction starts automatically
pub const INTER_SET_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Ready,
    Contract,
    Relax,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Ready => "Ready",
            Phase::Contract => "Contract",
            Phase::Relax => "Relax",
        }
    }
}

/// Mutable progress of the session in flight
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub elapsed_in_phase_ms: u64,
    /// Reps finished within the current set
    pub completed_reps: u32,
    /// Sets finished within the current session
    pub completed_sets: u32,
    pub is_running: bool,
}

impl SessionState {
    pub fn elapsed_in_phase(&self) -> f64 {
        self.elapsed_in_phase_ms as f64 / 1000.0
    }
}

/// Totals handed to the recorder once a full session is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub difficulty: Difficulty,
    pub sets_completed: u32,
    pub reps_completed: u32,
    pub total_duration_secs: u32,
    pub contract_secs: f64,
    pub relax_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Recorded { record_id: i64 },
    Failed(String),
}

/// Something the view should react to, produced by at most one per tick
#[derive(Debug, Clone, PartialEq)]
pub enum TrainerEvent {
    PhaseChanged { from: Phase, to: Phase },
    /// A set finished and the inter-set pause began
    SetCompleted { sets_completed: u32 },
    InterSetResumed,
    SessionCompleted {
        session: CompletedSession,
        outcome: RecordOutcome,
    },
}

/// Deferred resume into `Contract`, valid only for the generation it was
/// scheduled in.
#[derive(Debug, Clone, Copy)]
struct ScheduledResume {
    generation: u64,
    remaining_ms: u64,
}

/// Exercise phase controller.
///
/// Owns the single [`SessionState`] and advances it from a fixed-cadence
/// clock. Everything here is synchronous and deterministic: the caller
/// decides how time passes by calling [`Trainer::advance`].
pub struct Trainer<I: IdentityProvider, R: SessionRecorder> {
    identity: I,
    recorder: R,
    difficulty: Difficulty,
    state: SessionState,
    /// Bumped by every user action that invalidates a scheduled resume
    generation: u64,
    scheduled_resume: Option<ScheduledResume>,
    /// Time spent ticking inside phases for the session in flight
    active_ms: u64,
    session_user: Option<UserId>,
    last_record_error: Option<String>,
    last_completed: Option<CompletedSession>,
}

impl<I: IdentityProvider, R: SessionRecorder> Trainer<I, R> {
    pub fn new(difficulty: Difficulty, identity: I, recorder: R) -> Self {
        difficulty.profile().assert_valid();
        Self {
            identity,
            recorder,
            difficulty,
            state: SessionState::default(),
            generation: 0,
            scheduled_resume: None,
            active_ms: 0,
            session_user: None,
            last_record_error: None,
            last_completed: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        self.difficulty.profile()
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut I {
        &mut self.identity
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut R {
        &mut self.recorder
    }

    /// Error from the most recent recording attempt, cleared on success or
    /// when a fresh session starts.
    pub fn last_record_error(&self) -> Option<&str> {
        self.last_record_error.as_deref()
    }

    pub fn last_completed(&self) -> Option<&CompletedSession> {
        self.last_completed.as_ref()
    }

    pub fn is_inter_set_pause(&self) -> bool {
        matches!(self.scheduled_resume, Some(r) if r.generation == self.generation)
    }

    /// 1-based set number for display
    pub fn current_set(&self) -> u32 {
        (self.state.completed_sets + 1).min(self.profile().sets_to_complete())
    }

    /// 1-based rep number for display
    pub fn current_rep(&self) -> u32 {
        (self.state.completed_reps + 1).min(self.profile().reps_per_set)
    }

    pub fn progress_percent(&self) -> f64 {
        let duration = self.profile().phase_duration_ms(self.state.phase);
        if self.state.phase == Phase::Ready || duration == 0 {
            return 0.0;
        }
        (self.state.elapsed_in_phase_ms as f64 / duration as f64 * 100.0).clamp(0.0, 100.0)
    }

    pub fn remaining_seconds(&self) -> f64 {
        let duration = self.profile().phase_duration_ms(self.state.phase);
        duration.saturating_sub(self.state.elapsed_in_phase_ms) as f64 / 1000.0
    }

    /// Begin a fresh session from `Ready`, or resume the paused one.
    pub fn start(&mut self) -> Result<(), TrainerError> {
        let Some(user) = self.identity.current_user() else {
            warn!("start refused: no wallet connected");
            return Err(TrainerError::IdentityRequired);
        };
        if self.state.is_running {
            return Ok(());
        }

        if self.state.phase == Phase::Ready {
            self.state = SessionState {
                phase: Phase::Contract,
                is_running: true,
                ..SessionState::default()
            };
            self.active_ms = 0;
            self.last_record_error = None;
            self.session_user = Some(user);
            info!(difficulty = %self.difficulty, "session started");
        } else {
            self.state.is_running = true;
            self.session_user.get_or_insert(user);
            debug!(phase = ?self.state.phase, "session resumed");
        }
        // starting inside the inter-set pause skips the rest of it
        self.cancel_scheduled_resume();
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state.is_running {
            debug!(phase = ?self.state.phase, "session paused");
        }
        self.state.is_running = false;
        self.cancel_scheduled_resume();
    }

    pub fn toggle(&mut self) -> Result<(), TrainerError> {
        if self.state.is_running {
            self.pause();
            Ok(())
        } else {
            self.start()
        }
    }

    pub fn reset(&mut self) {
        self.state = SessionState::default();
        self.active_ms = 0;
        self.session_user = None;
        self.cancel_scheduled_resume();
    }

    /// Switch schedules. Refused mid-session so counts never mix profiles.
    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<(), TrainerError> {
        if self.state.is_running {
            return Err(TrainerError::DifficultyLocked(difficulty));
        }
        difficulty.profile().assert_valid();
        self.difficulty = difficulty;
        self.reset();
        debug!(%difficulty, "difficulty selected");
        Ok(())
    }

    /// Stop everything before the view goes away; no resume may fire later.
    pub fn shutdown(&mut self) {
        self.state.is_running = false;
        self.cancel_scheduled_resume();
    }

    /// Clock entry point, called on every cadence tick whether running or not.
    pub fn advance(&mut self, delta: Duration) -> Option<TrainerEvent> {
        if self.state.is_running {
            return self.tick(delta);
        }

        let scheduled = self.scheduled_resume?;
        if scheduled.generation != self.generation {
            self.scheduled_resume = None;
            return None;
        }

        let remaining_ms = scheduled
            .remaining_ms
            .saturating_sub(delta.as_millis() as u64);
        if remaining_ms > 0 {
            self.scheduled_resume = Some(ScheduledResume {
                remaining_ms,
                ..scheduled
            });
            return None;
        }

        self.scheduled_resume = None;
        self.state.phase = Phase::Contract;
        self.state.elapsed_in_phase_ms = 0;
        self.state.is_running = true;
        debug!(set = self.current_set(), "inter-set pause over");
        Some(TrainerEvent::InterSetResumed)
    }

    /// Advance the running session by `delta`. No-op while paused.
    ///
    /// Overflow past a phase boundary is dropped: the next phase always
    /// starts from zero.
    pub fn tick(&mut self, delta: Duration) -> Option<TrainerEvent> {
        if !self.state.is_running || self.state.phase == Phase::Ready {
            return None;
        }

        let delta_ms = delta.as_millis() as u64;
        self.state.elapsed_in_phase_ms += delta_ms;
        self.active_ms += delta_ms;

        let profile = self.profile();
        if self.state.elapsed_in_phase_ms < profile.phase_duration_ms(self.state.phase) {
            return None;
        }
        self.state.elapsed_in_phase_ms = 0;

        match self.state.phase {
            Phase::Contract => Some(self.enter(Phase::Relax)),
            Phase::Relax => {
                self.state.completed_reps += 1;
                if self.state.completed_reps < profile.reps_per_set {
                    return Some(self.enter(Phase::Contract));
                }

                self.state.completed_reps = 0;
                self.state.completed_sets += 1;
                if self.state.completed_sets >= profile.sets_to_complete() {
                    return Some(self.complete_session());
                }

                self.begin_inter_set_pause();
                Some(TrainerEvent::SetCompleted {
                    sets_completed: self.state.completed_sets,
                })
            }
            Phase::Ready => None,
        }
    }

    fn enter(&mut self, to: Phase) -> TrainerEvent {
        let from = self.state.phase;
        self.state.phase = to;
        debug!(?from, ?to, rep = self.state.completed_reps, "phase changed");
        TrainerEvent::PhaseChanged { from, to }
    }

    fn begin_inter_set_pause(&mut self) {
        info!(
            sets = self.state.completed_sets,
            of = self.profile().sets_to_complete(),
            "set complete"
        );
        self.state.phase = Phase::Contract;
        self.state.is_running = false;
        self.scheduled_resume = Some(ScheduledResume {
            generation: self.generation,
            remaining_ms: INTER_SET_PAUSE.as_millis() as u64,
        });
    }

    fn cancel_scheduled_resume(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.scheduled_resume = None;
    }

    /// Return to `Ready` and hand the totals to the recorder exactly once.
    /// A failed write is reported but the local completion stands.
    fn complete_session(&mut self) -> TrainerEvent {
        let profile = self.profile();
        let sets_completed = self.state.completed_sets;
        let session = CompletedSession {
            difficulty: self.difficulty,
            sets_completed,
            reps_completed: profile.reps_per_set * sets_completed,
            total_duration_secs: ((self.active_ms + 500) / 1000) as u32,
            contract_secs: profile.contract_secs,
            relax_secs: profile.relax_secs,
        };

        self.state = SessionState::default();
        self.active_ms = 0;
        self.cancel_scheduled_resume();

        info!(
            difficulty = %session.difficulty,
            sets = session.sets_completed,
            reps = session.reps_completed,
            secs = session.total_duration_secs,
            "session complete"
        );

        let outcome = match self.session_user.take() {
            Some(user) => match self.recorder.record(&user, &session) {
                Ok(record) => {
                    self.last_record_error = None;
                    RecordOutcome::Recorded {
                        record_id: record.id,
                    }
                }
                Err(err) => {
                    warn!(error = %err, "failed to record training session");
                    self.last_record_error = Some(err.to_string());
                    RecordOutcome::Failed(err.to_string())
                }
            },
            None => {
                let msg = TrainerError::IdentityRequired.to_string();
                warn!("session finished without a wallet; not recorded");
                self.last_record_error = Some(msg.clone());
                RecordOutcome::Failed(msg)
            }
        };

        self.last_completed = Some(session.clone());
        TrainerEvent::SessionCompleted { session, outcome }
    }
}
