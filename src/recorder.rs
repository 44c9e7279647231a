use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::ValueEnum;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::error::{RecordError, RecordResult};
use crate::identity::UserId;
use crate::profile::Difficulty;
use crate::trainer::CompletedSession;

/// Destination for finished sessions. Called once per completed session.
pub trait SessionRecorder {
    fn record(&mut self, user: &UserId, session: &CompletedSession)
        -> RecordResult<TrainingRecord>;
}

/// One stored training session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRecord {
    pub id: i64,
    pub user_id: UserId,
    pub difficulty: Difficulty,
    pub sets_completed: u32,
    pub reps_completed: u32,
    pub total_duration_secs: u32,
    pub contract_secs: f64,
    pub relax_secs: f64,
    pub session_date: NaiveDate,
    pub recorded_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyBreakdown {
    pub difficulty: Difficulty,
    pub session_count: u32,
    pub total_sets: u32,
    pub total_reps: u32,
    pub total_time_minutes: f64,
}

/// Aggregate view of a user's history
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingSummary {
    pub total_sessions: u32,
    pub total_duration_minutes: f64,
    pub streak_days: u32,
    pub today_sessions: u32,
    pub weekly_sessions: u32,
    pub monthly_sessions: u32,
    pub breakdown: Vec<DifficultyBreakdown>,
    pub last_session_at: Option<DateTime<Local>>,
}

impl TrainingSummary {
    pub fn sessions_for(&self, difficulty: Difficulty) -> u32 {
        self.breakdown
            .iter()
            .find(|b| b.difficulty == difficulty)
            .map(|b| b.session_count)
            .unwrap_or(0)
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS training_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        difficulty TEXT NOT NULL,
        sets_completed INTEGER NOT NULL,
        reps_completed INTEGER NOT NULL,
        total_duration INTEGER NOT NULL,
        contract_time REAL NOT NULL,
        relax_time REAL NOT NULL,
        session_date TEXT NOT NULL,
        recorded_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_training_records_user ON training_records(user_id);
    CREATE INDEX IF NOT EXISTS idx_training_records_date ON training_records(session_date);
"#;

const RECORD_COLUMNS: &str = "id, user_id, difficulty, sets_completed, reps_completed, \
     total_duration, contract_time, relax_time, session_date, recorded_at";

/// SQLite-backed training history
#[derive(Debug)]
pub struct TrainingDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl TrainingDb {
    /// Open the database under the state directory, creating it if needed
    pub fn new() -> RecordResult<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("peed_training.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> RecordResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "training database opened");

        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> RecordResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Store a session as finished at `recorded_at`. The timestamp is kept
    /// in UTC so that text ordering matches time ordering across offsets.
    pub fn insert_record<Tz: TimeZone>(
        &self,
        user: &UserId,
        session: &CompletedSession,
        recorded_at: DateTime<Tz>,
    ) -> RecordResult<TrainingRecord> {
        if session.sets_completed == 0 || session.reps_completed == 0 {
            return Err(RecordError::InvalidSession(format!(
                "{} sets / {} reps",
                session.sets_completed, session.reps_completed
            )));
        }

        let recorded_at = recorded_at.with_timezone(&Local);
        let session_date = recorded_at.date_naive();
        self.conn.execute(
            r#"
            INSERT INTO training_records
            (user_id, difficulty, sets_completed, reps_completed, total_duration,
             contract_time, relax_time, session_date, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                user.as_str(),
                session.difficulty.to_string(),
                session.sets_completed,
                session.reps_completed,
                session.total_duration_secs,
                session.contract_secs,
                session.relax_secs,
                session_date.to_string(),
                recorded_at.with_timezone(&Utc).to_rfc3339(),
            ],
        )?;

        Ok(TrainingRecord {
            id: self.conn.last_insert_rowid(),
            user_id: user.clone(),
            difficulty: session.difficulty,
            sets_completed: session.sets_completed,
            reps_completed: session.reps_completed,
            total_duration_secs: session.total_duration_secs,
            contract_secs: session.contract_secs,
            relax_secs: session.relax_secs,
            session_date,
            recorded_at,
        })
    }

    /// Most recent sessions first, optionally filtered by difficulty
    pub fn history(
        &self,
        user: &UserId,
        difficulty: Option<Difficulty>,
        limit: usize,
    ) -> RecordResult<Vec<TrainingRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM training_records \
             WHERE user_id = ?1 AND (?2 IS NULL OR difficulty = ?2) \
             ORDER BY recorded_at DESC, id DESC LIMIT ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                user.as_str(),
                difficulty.map(|d| d.to_string()),
                limit as i64
            ],
            row_to_record,
        )?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    /// Sessions with `start <= session_date <= end`
    pub fn sessions_between(
        &self,
        user: &UserId,
        difficulty: Option<Difficulty>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RecordResult<u32> {
        let count: u32 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM training_records
            WHERE user_id = ?1 AND (?2 IS NULL OR difficulty = ?2)
              AND session_date >= ?3 AND session_date <= ?4
            "#,
            params![
                user.as_str(),
                difficulty.map(|d| d.to_string()),
                start.to_string(),
                end.to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn session_count(&self, user: &UserId, difficulty: Difficulty) -> RecordResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM training_records WHERE user_id = ?1 AND difficulty = ?2",
            params![user.as_str(), difficulty.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Consecutive training days ending today, or yesterday if today has no
    /// session yet.
    pub fn streak_days(&self, user: &UserId, today: NaiveDate) -> RecordResult<u32> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT session_date FROM training_records \
             WHERE user_id = ?1 ORDER BY session_date DESC",
        )?;
        let rows = stmt.query_map([user.as_str()], |row| row.get::<_, String>(0))?;

        let mut dates = Vec::new();
        for date in rows {
            let date = date?;
            if let Ok(d) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
                dates.push(d);
            }
        }

        let yesterday = today - Duration::days(1);
        let mut cursor = match dates.first() {
            Some(&d) if d == today || d == yesterday => d,
            _ => return Ok(0),
        };

        let mut streak = 0;
        for date in dates {
            if date != cursor {
                break;
            }
            streak += 1;
            cursor = cursor - Duration::days(1);
        }
        Ok(streak)
    }

    pub fn breakdown(&self, user: &UserId) -> RecordResult<Vec<DifficultyBreakdown>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT difficulty, COUNT(*), SUM(sets_completed), SUM(reps_completed), SUM(total_duration)
            FROM training_records
            WHERE user_id = ?1
            GROUP BY difficulty
            "#,
        )?;
        let rows = stmt.query_map([user.as_str()], |row| {
            let difficulty: String = row.get(0)?;
            let total_secs: Option<i64> = row.get(4)?;
            Ok((
                difficulty,
                row.get::<_, u32>(1)?,
                row.get::<_, Option<u32>>(2)?.unwrap_or(0),
                row.get::<_, Option<u32>>(3)?.unwrap_or(0),
                total_secs.unwrap_or(0),
            ))
        })?;

        let mut breakdown = Vec::new();
        for row in rows {
            let (difficulty, session_count, total_sets, total_reps, total_secs) = row?;
            // rows written by an unknown level are skipped
            let Ok(difficulty) = Difficulty::from_str(&difficulty, true) else {
                continue;
            };
            breakdown.push(DifficultyBreakdown {
                difficulty,
                session_count,
                total_sets,
                total_reps,
                total_time_minutes: minutes(total_secs),
            });
        }
        breakdown.sort_by_key(|b| b.difficulty as u8);
        Ok(breakdown)
    }

    pub fn summary(&self, user: &UserId, today: NaiveDate) -> RecordResult<TrainingSummary> {
        let (total_sessions, total_secs): (u32, Option<i64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(total_duration) FROM training_records WHERE user_id = ?1",
            [user.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let month_start = today.with_day(1).unwrap_or(today);

        let last_session_at: Option<String> = self
            .conn
            .query_row(
                "SELECT MAX(recorded_at) FROM training_records WHERE user_id = ?1",
                [user.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        let last_session_at = last_session_at
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Local));

        Ok(TrainingSummary {
            total_sessions,
            total_duration_minutes: minutes(total_secs.unwrap_or(0)),
            streak_days: self.streak_days(user, today)?,
            today_sessions: self.sessions_between(user, None, today, today)?,
            weekly_sessions: self.sessions_between(user, None, week_start, today)?,
            monthly_sessions: self.sessions_between(user, None, month_start, today)?,
            breakdown: self.breakdown(user)?,
            last_session_at,
        })
    }

    /// Write the user's full history as CSV, oldest first. Returns rows written.
    pub fn export_csv<W: Write>(&self, user: &UserId, writer: W) -> RecordResult<usize> {
        let mut records = self.history(user, None, usize::MAX >> 1)?;
        records.reverse();

        let mut wtr = csv::Writer::from_writer(writer);
        for record in &records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        info!(rows = records.len(), "training history exported");
        Ok(records.len())
    }
}

impl SessionRecorder for TrainingDb {
    fn record(
        &mut self,
        user: &UserId,
        session: &CompletedSession,
    ) -> RecordResult<TrainingRecord> {
        let record = self.insert_record(user, session, Local::now())?;
        info!(id = record.id, difficulty = %record.difficulty, "training session recorded");
        Ok(record)
    }
}

/// In-memory recorder for headless runs and tests. Can be told to fail.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Vec<TrainingRecord>,
    failure: Option<String>,
}

impl MemoryRecorder {
    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    /// Make every following `record` call fail with `reason`
    pub fn fail_with(&mut self, reason: &str) {
        self.failure = Some(reason.to_string());
    }

    pub fn recover(&mut self) {
        self.failure = None;
    }
}

impl SessionRecorder for MemoryRecorder {
    fn record(
        &mut self,
        user: &UserId,
        session: &CompletedSession,
    ) -> RecordResult<TrainingRecord> {
        if let Some(reason) = &self.failure {
            return Err(RecordError::Unavailable(reason.clone()));
        }
        let recorded_at = Local::now();
        let record = TrainingRecord {
            id: self.records.len() as i64 + 1,
            user_id: user.clone(),
            difficulty: session.difficulty,
            sets_completed: session.sets_completed,
            reps_completed: session.reps_completed,
            total_duration_secs: session.total_duration_secs,
            contract_secs: session.contract_secs,
            relax_secs: session.relax_secs,
            session_date: recorded_at.date_naive(),
            recorded_at,
        };
        self.records.push(record.clone());
        Ok(record)
    }
}

fn minutes(secs: i64) -> f64 {
    (secs as f64 / 60.0 * 10.0).round() / 10.0
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TrainingRecord> {
    let user: String = row.get(1)?;
    let difficulty: String = row.get(2)?;
    let session_date: String = row.get(8)?;
    let recorded_at: String = row.get(9)?;

    let invalid = |idx: usize, name: &str| {
        rusqlite::Error::InvalidColumnType(idx, name.to_string(), rusqlite::types::Type::Text)
    };

    Ok(TrainingRecord {
        id: row.get(0)?,
        user_id: UserId::parse(&user).map_err(|_| invalid(1, "user_id"))?,
        difficulty: Difficulty::from_str(&difficulty, true).map_err(|_| invalid(2, "difficulty"))?,
        sets_completed: row.get(3)?,
        reps_completed: row.get(4)?,
        total_duration_secs: row.get(5)?,
        contract_secs: row.get(6)?,
        relax_secs: row.get(7)?,
        session_date: NaiveDate::parse_from_str(&session_date, "%Y-%m-%d")
            .map_err(|_| invalid(8, "session_date"))?,
        recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|_| invalid(9, "recorded_at"))?
            .with_timezone(&Local),
    })
}
