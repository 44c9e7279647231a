use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Local;
use peed::identity::{StaticIdentity, UserId};
use peed::profile::Difficulty;
use peed::recorder::{MemoryRecorder, SessionRecorder, TrainingDb};
use peed::trainer::{Phase, RecordOutcome, Trainer, TrainerEvent};

/// End-to-end sessions driven by the phase controller and persisted to a
/// real SQLite file.

const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
const TICK: Duration = Duration::from_millis(100);

fn wallet() -> UserId {
    UserId::parse(WALLET).unwrap()
}

/// Tick until the session completes; returns the completion event and the
/// number of ticks it took.
fn run_to_completion<R: SessionRecorder>(
    trainer: &mut Trainer<StaticIdentity, R>,
) -> (TrainerEvent, usize) {
    for n in 1..=100_000 {
        if let Some(event @ TrainerEvent::SessionCompleted { .. }) = trainer.advance(TICK) {
            return (event, n);
        }
    }
    panic!("session never completed");
}

#[test]
fn beginner_session_is_recorded_once() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("training.db");
    let db = TrainingDb::open(&db_path).unwrap();

    let mut trainer = Trainer::new(
        Difficulty::Beginner,
        StaticIdentity::new(Some(wallet())),
        db,
    );
    trainer.start().unwrap();

    let (event, ticks) = run_to_completion(&mut trainer);
    // 3 sets of 12 x 8.5s plus two 2s rests
    assert_eq!(ticks, 3100);

    let TrainerEvent::SessionCompleted { session, outcome } = event else {
        unreachable!()
    };
    assert_eq!(session.difficulty, Difficulty::Beginner);
    assert_eq!(session.sets_completed, 3);
    assert_eq!(session.reps_completed, 36);
    assert_eq!(session.total_duration_secs, 306);
    assert_eq!(session.contract_secs, 3.0);
    assert_eq!(session.relax_secs, 5.5);
    assert_matches!(outcome, RecordOutcome::Recorded { record_id } if record_id > 0);

    assert_eq!(trainer.phase(), Phase::Ready);
    assert!(!trainer.is_running());

    // nothing fires after completion
    for _ in 0..100 {
        assert_eq!(trainer.advance(TICK), None);
    }

    let reopened = TrainingDb::open(&db_path).unwrap();
    let history = reopened.history(&wallet(), None, 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reps_completed, 36);
    assert_eq!(history[0].session_date, Local::now().date_naive());

    let summary = reopened.summary(&wallet(), Local::now().date_naive()).unwrap();
    assert_eq!(summary.total_sessions, 1);
    assert_eq!(summary.streak_days, 1);
    assert_eq!(summary.sessions_for(Difficulty::Beginner), 1);
    assert_eq!(summary.sessions_for(Difficulty::Advanced), 0);
}

#[test]
fn pause_during_inter_set_rest_wins_over_auto_resume() {
    let mut trainer = Trainer::new(
        Difficulty::Beginner,
        StaticIdentity::new(Some(wallet())),
        MemoryRecorder::default(),
    );
    trainer.start().unwrap();

    let mut set_done = None;
    for _ in 0..1020 {
        if let Some(event) = trainer.advance(TICK) {
            if matches!(event, TrainerEvent::SetCompleted { .. }) {
                set_done = Some(event);
            }
        }
    }
    assert_matches!(set_done, Some(TrainerEvent::SetCompleted { sets_completed: 1 }));
    assert!(trainer.is_inter_set_pause());
    assert_eq!(trainer.phase(), Phase::Contract);
    assert!(!trainer.is_running());

    trainer.pause();
    for _ in 0..50 {
        assert_eq!(trainer.advance(TICK), None);
    }
    assert!(!trainer.is_running());
    assert_eq!(trainer.state().completed_sets, 1);

    trainer.start().unwrap();
    assert!(trainer.is_running());
    assert_eq!(trainer.phase(), Phase::Contract);
    assert_eq!(trainer.state().elapsed_in_phase_ms, 0);
}

#[test]
fn failed_recording_still_completes_the_session() {
    let mut recorder = MemoryRecorder::default();
    recorder.fail_with("disk full");
    let mut trainer = Trainer::new(
        Difficulty::Intermediate,
        StaticIdentity::new(Some(wallet())),
        recorder,
    );
    trainer.start().unwrap();

    let (event, _) = run_to_completion(&mut trainer);
    assert_matches!(
        event,
        TrainerEvent::SessionCompleted { outcome: RecordOutcome::Failed(ref msg), .. }
            if msg.contains("disk full")
    );
    assert_eq!(trainer.phase(), Phase::Ready);
    assert!(trainer.recorder().records().is_empty());
    assert!(trainer.last_record_error().is_some());
}

#[test]
fn sessions_per_difficulty_feed_progression() {
    let dir = tempfile::tempdir().unwrap();
    let db = TrainingDb::open(dir.path().join("training.db")).unwrap();
    let mut trainer = Trainer::new(
        Difficulty::Advanced,
        StaticIdentity::new(Some(wallet())),
        db,
    );

    for _ in 0..2 {
        trainer.start().unwrap();
        let (event, _) = run_to_completion(&mut trainer);
        assert_matches!(
            event,
            TrainerEvent::SessionCompleted { ref session, outcome: RecordOutcome::Recorded { .. } }
                if session.sets_completed == 5 && session.reps_completed == 125
        );
    }

    let count = trainer
        .recorder()
        .session_count(&wallet(), Difficulty::Advanced)
        .unwrap();
    assert_eq!(count, 2);
    let progression = peed::progression::ProgressionInfo::new(Difficulty::Advanced, count);
    assert!(!progression.can_progress);
    assert_eq!(progression.next, None);
}
