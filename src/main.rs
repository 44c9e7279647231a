use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use peed::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    identity::{StaticIdentity, UserId},
    logging::init_logging,
    profile::Difficulty,
    recorder::TrainingDb,
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    ui,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use tracing::{info, warn};
use webbrowser::Browser;

/// guided pelvic floor training in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guided Kegel sessions with contract/relax timing, per-level progression and a local training history."
)]
pub struct Cli {
    /// training level to start on (defaults to the last one used)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// wallet address identifying whose sessions are recorded
    #[clap(short = 'w', long)]
    wallet: Option<String>,

    /// training database location (defaults to the state directory)
    #[clap(long)]
    db: Option<PathBuf>,

    /// write the training history as CSV to this path and exit
    #[clap(long)]
    export: Option<PathBuf>,

    /// log level for the log file (overridden by PEED_LOG)
    #[clap(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn open_db(&self) -> Result<TrainingDb, Box<dyn Error>> {
        let db = match &self.db {
            Some(path) => TrainingDb::open(path)?,
            None => TrainingDb::new()?,
        };
        Ok(db)
    }
}

fn parse_wallet(address: Option<&str>) -> StaticIdentity {
    match address.map(UserId::parse) {
        None => StaticIdentity::anonymous(),
        Some(Ok(user)) => StaticIdentity::new(Some(user)),
        Some(Err(err)) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, format!("invalid wallet address: {err}"))
                .exit();
        }
    }
}

fn export(cli: &Cli, config: &Config, path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let Some(address) = config.wallet_address.as_deref() else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "--export needs a wallet: pass --wallet <address>",
        )
        .exit();
    };
    let user = UserId::parse(address)?;
    let db = cli.open_db()?;
    let rows = db.export_csv(&user, File::create(path)?)?;
    println!("exported {rows} sessions to {}", path.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = FileConfigStore::new();
    let config = store
        .load()
        .with_overrides(cli.difficulty, cli.wallet.clone());

    if let Err(err) = init_logging(&cli.log_level, AppDirs::log_path().as_deref()) {
        eprintln!("logging disabled: {err}");
    }

    if let Some(path) = &cli.export {
        return export(&cli, &config, path);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let identity = parse_wallet(config.wallet_address.as_deref());
    let db = cli.open_db()?;
    info!(difficulty = %config.difficulty, db = ?db.path(), "starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.difficulty, identity, db);
    let result = start_tui(
        &mut terminal,
        &mut app,
        Duration::from_millis(config.tick_rate_ms),
    );
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    let saved = Config {
        difficulty: app.trainer.difficulty(),
        ..config
    };
    if let Err(err) = store.save(&saved) {
        warn!(error = %err, "failed to save config");
    }

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(tick_rate),
    );

    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        match runner.step() {
            AppEvent::Tick => {
                let was_running = app.trainer.is_running() || app.trainer.is_inter_set_pause();
                let event = app.on_tick(runner.tick_delta());
                // only redraw while the clock is moving or something changed
                if was_running || event.is_some() {
                    terminal.draw(|f| ui::draw(app, f))?;
                }
            }
            AppEvent::Resize => {
                terminal.draw(|f| ui::draw(app, f))?;
            }
            AppEvent::Key(key) => {
                if key.code == KeyCode::Char('t') {
                    if let Some(url) = app.share_url() {
                        if Browser::is_available() {
                            webbrowser::open(&url).unwrap_or_default();
                        }
                    }
                } else {
                    app.on_key(key);
                }
                terminal.draw(|f| ui::draw(app, f))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["peed"]);

        assert_eq!(cli.difficulty, None);
        assert_eq!(cli.wallet, None);
        assert_eq!(cli.db, None);
        assert_eq!(cli.export, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_cli_difficulty() {
        let cli = Cli::parse_from(["peed", "-d", "intermediate"]);
        assert_eq!(cli.difficulty, Some(Difficulty::Intermediate));

        let cli = Cli::parse_from(["peed", "--difficulty", "advanced"]);
        assert_eq!(cli.difficulty, Some(Difficulty::Advanced));

        assert!(Cli::try_parse_from(["peed", "-d", "expert"]).is_err());
    }

    #[test]
    fn test_cli_wallet_and_paths() {
        let cli = Cli::parse_from([
            "peed",
            "-w",
            "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU",
            "--db",
            "/tmp/t.db",
            "--export",
            "/tmp/out.csv",
            "--log-level",
            "debug",
        ]);
        assert_eq!(
            cli.wallet.as_deref(),
            Some("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU")
        );
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/t.db")));
        assert_eq!(cli.export, Some(PathBuf::from("/tmp/out.csv")));
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn test_parse_wallet_anonymous() {
        use peed::identity::IdentityProvider;
        assert!(parse_wallet(None).current_user().is_none());
        let identity = parse_wallet(Some("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"));
        assert!(identity.current_user().is_some());
    }
}
