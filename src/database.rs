//! Run storage
//!
//! [`RunRepository`] is the only way runs are created, edited or removed.
//! The analytics read snapshots returned by `list_all` and never write back.

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;

use crate::error::DatabaseError;
use crate::models::{NewRun, Run, TargetHeartRate};

/// Stored timestamp format; sorts chronologically as text
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

const RUN_COLUMNS: &str = "id, date, duration_minutes, target_heart_rate, distance_miles, \
     final_minute_speed, total_feet_climbed, final_minute_incline";

/// Storage contract for treadmill runs
pub trait RunRepository {
    /// Every run, newest first
    fn list_all(&self) -> Result<Vec<Run>, DatabaseError>;

    /// Runs in one heart-rate group, newest first
    fn list_by_heart_rate(&self, heart_rate: TargetHeartRate) -> Result<Vec<Run>, DatabaseError>;

    fn get(&self, id: i64) -> Result<Option<Run>, DatabaseError>;

    /// Heart-rate groups in use, ascending by stored value
    fn distinct_heart_rates(&self) -> Result<Vec<TargetHeartRate>, DatabaseError>;

    /// Most recent run in a heart-rate group
    fn latest_by_heart_rate(
        &self,
        heart_rate: TargetHeartRate,
    ) -> Result<Option<Run>, DatabaseError>;

    /// Store a new run and return it with its assigned id
    fn insert(&mut self, run: NewRun) -> Result<Run, DatabaseError>;

    /// Replace a stored run in full
    fn update(&mut self, run: &Run) -> Result<(), DatabaseError>;

    /// Remove a run; `false` when no run had that id
    fn delete(&mut self, id: i64) -> Result<bool, DatabaseError>;
}

/// SQLite-backed repository
pub struct SqliteRunRepository {
    conn: Connection,
}

impl SqliteRunRepository {
    /// Create or open a database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DatabaseError::Open {
                path: db_path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(db_path)?;
        tracing::info!(path = %db_path.display(), "Opened run database");
        Self::with_connection(conn)
    }

    /// Database that lives only as long as the repository
    pub fn in_memory() -> Result<Self, DatabaseError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        let repo = Self { conn };
        repo.init_schema()?;
        Ok(repo)
    }

    /// Initialize database schema with tables and indexes
    fn init_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            "#,
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS treadmill_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                target_heart_rate INTEGER NOT NULL,
                distance_miles REAL NOT NULL,
                final_minute_speed REAL NOT NULL,
                total_feet_climbed INTEGER NOT NULL,
                final_minute_incline REAL NOT NULL
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_runs_date ON treadmill_runs (date)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_runs_heart_rate_date ON treadmill_runs (target_heart_rate, date)",
            [],
        )?;

        Ok(())
    }

    fn query_runs(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Run>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, StoredRun::from_row)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?.into_run()?);
        }
        Ok(runs)
    }

    fn query_run(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Option<Run>, DatabaseError> {
        self.conn
            .query_row(sql, params, StoredRun::from_row)
            .optional()?
            .map(StoredRun::into_run)
            .transpose()
    }
}

impl RunRepository for SqliteRunRepository {
    fn list_all(&self) -> Result<Vec<Run>, DatabaseError> {
        let runs = self.query_runs(
            &format!(
                "SELECT {} FROM treadmill_runs ORDER BY date DESC, id DESC",
                RUN_COLUMNS
            ),
            [],
        )?;
        tracing::debug!(count = runs.len(), "Loaded runs");
        Ok(runs)
    }

    fn list_by_heart_rate(&self, heart_rate: TargetHeartRate) -> Result<Vec<Run>, DatabaseError> {
        self.query_runs(
            &format!(
                "SELECT {} FROM treadmill_runs WHERE target_heart_rate = ?1 ORDER BY date DESC, id DESC",
                RUN_COLUMNS
            ),
            params![heart_rate.raw()],
        )
    }

    fn get(&self, id: i64) -> Result<Option<Run>, DatabaseError> {
        self.query_run(
            &format!("SELECT {} FROM treadmill_runs WHERE id = ?1", RUN_COLUMNS),
            params![id],
        )
    }

    fn distinct_heart_rates(&self) -> Result<Vec<TargetHeartRate>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT target_heart_rate FROM treadmill_runs ORDER BY target_heart_rate ASC",
        )?;
        let values = stmt.query_map([], |row| row.get::<_, i32>(0))?;

        let mut heart_rates = Vec::new();
        for value in values {
            let raw = value?;
            match TargetHeartRate::from_raw(raw) {
                Some(heart_rate) => heart_rates.push(heart_rate),
                None => tracing::warn!(raw, "Skipping out of range heart rate"),
            }
        }
        Ok(heart_rates)
    }

    fn latest_by_heart_rate(
        &self,
        heart_rate: TargetHeartRate,
    ) -> Result<Option<Run>, DatabaseError> {
        self.query_run(
            &format!(
                "SELECT {} FROM treadmill_runs WHERE target_heart_rate = ?1 ORDER BY date DESC, id DESC LIMIT 1",
                RUN_COLUMNS
            ),
            params![heart_rate.raw()],
        )
    }

    fn insert(&mut self, run: NewRun) -> Result<Run, DatabaseError> {
        run.validate().map_err(DatabaseError::Validation)?;

        self.conn.execute(
            r#"
            INSERT INTO treadmill_runs (
                date, duration_minutes, target_heart_rate, distance_miles,
                final_minute_speed, total_feet_climbed, final_minute_incline
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                run.date.format(DATE_FORMAT).to_string(),
                run.duration_minutes,
                run.target_heart_rate.raw(),
                run.distance_miles,
                run.final_minute_speed,
                run.total_feet_climbed,
                run.final_minute_incline,
            ],
        )?;

        let run = run.with_id(self.conn.last_insert_rowid());
        tracing::info!(id = run.id, date = %run.date, heart_rate = %run.target_heart_rate, "Run stored");
        Ok(run)
    }

    fn update(&mut self, run: &Run) -> Result<(), DatabaseError> {
        NewRun::from(run.clone())
            .validate()
            .map_err(DatabaseError::Validation)?;

        let changed = self.conn.execute(
            r#"
            UPDATE treadmill_runs SET
                date = ?2, duration_minutes = ?3, target_heart_rate = ?4, distance_miles = ?5,
                final_minute_speed = ?6, total_feet_climbed = ?7, final_minute_incline = ?8
            WHERE id = ?1
            "#,
            params![
                run.id,
                run.date.format(DATE_FORMAT).to_string(),
                run.duration_minutes,
                run.target_heart_rate.raw(),
                run.distance_miles,
                run.final_minute_speed,
                run.total_feet_climbed,
                run.final_minute_incline,
            ],
        )?;

        if changed == 0 {
            return Err(DatabaseError::NotFound { id: run.id });
        }
        tracing::info!(id = run.id, "Run updated");
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<bool, DatabaseError> {
        let changed = self
            .conn
            .execute("DELETE FROM treadmill_runs WHERE id = ?1", params![id])?;
        tracing::info!(id, deleted = changed > 0, "Run delete requested");
        Ok(changed > 0)
    }
}

/// Raw column values before the timestamp is parsed
struct StoredRun {
    id: i64,
    date: String,
    duration_minutes: u32,
    target_heart_rate: i32,
    distance_miles: f64,
    final_minute_speed: f64,
    total_feet_climbed: u32,
    final_minute_incline: f64,
}

impl StoredRun {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            duration_minutes: row.get("duration_minutes")?,
            target_heart_rate: row.get("target_heart_rate")?,
            distance_miles: row.get("distance_miles")?,
            final_minute_speed: row.get("final_minute_speed")?,
            total_feet_climbed: row.get("total_feet_climbed")?,
            final_minute_incline: row.get("final_minute_incline")?,
        })
    }

    fn into_run(self) -> Result<Run, DatabaseError> {
        let date = NaiveDateTime::parse_from_str(&self.date, DATE_FORMAT).map_err(|e| {
            DatabaseError::InvalidRow {
                id: self.id,
                reason: format!("bad date '{}': {}", self.date, e),
            }
        })?;

        let target_heart_rate = TargetHeartRate::from_raw(self.target_heart_rate).ok_or_else(
            || DatabaseError::InvalidRow {
                id: self.id,
                reason: format!("heart rate out of range: {}", self.target_heart_rate),
            },
        )?;

        Ok(Run {
            id: self.id,
            date,
            duration_minutes: self.duration_minutes,
            target_heart_rate,
            distance_miles: self.distance_miles,
            final_minute_speed: self.final_minute_speed,
            total_feet_climbed: self.total_feet_climbed,
            final_minute_incline: self.final_minute_incline,
        })
    }
}

/// Repository held entirely in memory, for tests and previews
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunRepository {
    runs: Vec<Run>,
    next_id: i64,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first(mut runs: Vec<Run>) -> Vec<Run> {
        runs.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        runs
    }
}

impl RunRepository for InMemoryRunRepository {
    fn list_all(&self) -> Result<Vec<Run>, DatabaseError> {
        Ok(Self::newest_first(self.runs.clone()))
    }

    fn list_by_heart_rate(&self, heart_rate: TargetHeartRate) -> Result<Vec<Run>, DatabaseError> {
        Ok(Self::newest_first(
            self.runs
                .iter()
                .filter(|run| run.target_heart_rate == heart_rate)
                .cloned()
                .collect(),
        ))
    }

    fn get(&self, id: i64) -> Result<Option<Run>, DatabaseError> {
        Ok(self.runs.iter().find(|run| run.id == id).cloned())
    }

    fn distinct_heart_rates(&self) -> Result<Vec<TargetHeartRate>, DatabaseError> {
        let mut heart_rates: Vec<TargetHeartRate> =
            self.runs.iter().map(|run| run.target_heart_rate).collect();
        heart_rates.sort();
        heart_rates.dedup();
        Ok(heart_rates)
    }

    fn latest_by_heart_rate(
        &self,
        heart_rate: TargetHeartRate,
    ) -> Result<Option<Run>, DatabaseError> {
        Ok(self.list_by_heart_rate(heart_rate)?.into_iter().next())
    }

    fn insert(&mut self, run: NewRun) -> Result<Run, DatabaseError> {
        run.validate().map_err(DatabaseError::Validation)?;
        self.next_id += 1;
        let run = run.with_id(self.next_id);
        self.runs.push(run.clone());
        Ok(run)
    }

    fn update(&mut self, run: &Run) -> Result<(), DatabaseError> {
        NewRun::from(run.clone())
            .validate()
            .map_err(DatabaseError::Validation)?;
        let stored = self
            .runs
            .iter_mut()
            .find(|stored| stored.id == run.id)
            .ok_or(DatabaseError::NotFound { id: run.id })?;
        *stored = run.clone();
        Ok(())
    }

    fn delete(&mut self, id: i64) -> Result<bool, DatabaseError> {
        let before = self.runs.len();
        self.runs.retain(|run| run.id != id);
        Ok(self.runs.len() < before)
    }
}
