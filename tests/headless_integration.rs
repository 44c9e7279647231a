use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use peed::app::App;
use peed::identity::{StaticIdentity, UserId};
use peed::profile::Difficulty;
use peed::recorder::TrainingDb;
use peed::runtime::{AppEvent, FixedTicker, Runner, TestEventSource};
use peed::trainer::Phase;

const WALLET: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

// Headless run of the real runner loop without a TTY: a key starts the
// session and the ticker drives it from there.
#[test]
fn headless_session_runs_from_runner_ticks() {
    let identity = StaticIdentity::new(Some(UserId::parse(WALLET).unwrap()));
    let mut app = App::new(
        Difficulty::Beginner,
        identity,
        TrainingDb::open_in_memory().unwrap(),
    );

    let (tx, rx) = mpsc::channel();
    let mut runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    tx.send(AppEvent::Key(KeyEvent::new(
        KeyCode::Char(' '),
        KeyModifiers::NONE,
    )))
    .unwrap();

    let mut ticks = 0;
    while ticks < 40 {
        match runner.step() {
            AppEvent::Key(key) => app.on_key(key),
            // each tick stands for 100ms of training time
            AppEvent::Tick => {
                app.on_tick(Duration::from_millis(100));
                if app.trainer.is_running() {
                    ticks += 1;
                }
            }
            AppEvent::Resize => {}
        }
    }

    // 3s of contraction then 1s into relaxation
    assert!(app.trainer.is_running());
    assert_eq!(app.trainer.phase(), Phase::Relax);
    assert_eq!(app.trainer.state().elapsed_in_phase_ms, 1000);

    tx.send(AppEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
        .unwrap();
    while !app.should_quit {
        if let AppEvent::Key(key) = runner.step() {
            app.on_key(key);
        }
    }
    app.shutdown();
    assert!(!app.trainer.is_running());
}

#[test]
fn headless_ticks_are_ignored_before_start() {
    let mut app = App::new(
        Difficulty::Advanced,
        StaticIdentity::anonymous(),
        TrainingDb::open_in_memory().unwrap(),
    );
    for _ in 0..50 {
        assert!(app.on_tick(Duration::from_millis(100)).is_none());
    }
    assert_eq!(app.trainer.phase(), Phase::Ready);
    assert_eq!(app.trainer.state().elapsed_in_phase_ms, 0);
}
