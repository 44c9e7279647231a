// Drives the compiled binary through a PTY: start a session, pause it and quit.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_session_starts_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let db = dir.path().join("training.db");
    let bin = assert_cmd::cargo::cargo_bin("peed");
    let cmd = format!(
        "{} --wallet 7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU --db {}",
        bin.display(),
        db.display()
    );

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start, let a few ticks pass, pause
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(500));
    p.send(" ")?;
    std::thread::sleep(Duration::from_millis(100));

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;
    Ok(())
}
