use crate::controller::DifficultyIndex;
use crate::error::Result;
use crate::signal::Signal;
use crate::util::{mean, std_dev};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One completed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub error_rate: f64,
    pub wpm: f64,
    pub focus_score: f64,
    pub difficulty: DifficultyIndex,
}

impl HistoryEntry {
    pub fn new(signal: &Signal, difficulty: DifficultyIndex) -> Self {
        Self {
            timestamp: Local::now(),
            error_rate: signal.error_rate(),
            wpm: signal.wpm(),
            focus_score: signal.focus_score(),
            difficulty,
        }
    }
}

/// Append-only, in-order record of the rounds in a session.
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> Option<HistorySummary> {
        HistorySummary::from_entries(&self.entries)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySummary {
    pub rounds: usize,
    pub mean_difficulty: f64,
    pub difficulty_std_dev: f64,
    pub mean_error_rate: f64,
    pub mean_focus: f64,
}

impl HistorySummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let difficulties: Vec<f64> = entries.iter().map(|e| e.difficulty.value()).collect();
        let errors: Vec<f64> = entries.iter().map(|e| e.error_rate).collect();
        let focus: Vec<f64> = entries.iter().map(|e| e.focus_score).collect();

        Some(Self {
            rounds: entries.len(),
            mean_difficulty: mean(&difficulties)?,
            difficulty_std_dev: std_dev(&difficulties)?,
            mean_error_rate: mean(&errors)?,
            mean_focus: mean(&focus)?,
        })
    }
}

const CREATE_ROUNDS: &str = r#"
    CREATE TABLE IF NOT EXISTS rounds (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        error_rate REAL NOT NULL,
        wpm REAL NOT NULL,
        focus_score REAL NOT NULL,
        difficulty REAL NOT NULL
    )
"#;

/// SQLite-backed round history shared across sessions.
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open (creating if needed) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(CREATE_ROUNDS, [])?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_rounds_timestamp ON rounds(timestamp)",
            [],
        )?;
        Ok(HistoryDb { conn })
    }

    pub fn record(&self, entry: &HistoryEntry) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO rounds (timestamp, error_rate, wpm, focus_score, difficulty)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                entry.timestamp.to_rfc3339(),
                entry.error_rate,
                entry.wpm,
                entry.focus_score,
                entry.difficulty.value(),
            ],
        )?;
        Ok(())
    }

    /// All rounds, oldest first.
    pub fn all(&self) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, error_rate, wpm, focus_score, difficulty FROM rounds ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            let timestamp_str: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Local);

            Ok(HistoryEntry {
                timestamp,
                error_rate: row.get(1)?,
                wpm: row.get(2)?,
                focus_score: row.get(3)?,
                difficulty: DifficultyIndex::clipped(row.get(4)?),
            })
        })?;

        let mut entries = Vec::new();
        for entry in rows {
            entries.push(entry?);
        }
        Ok(entries)
    }

    /// Most recently recorded difficulty, used to resume a learner where they left off.
    pub fn latest_difficulty(&self) -> Result<Option<DifficultyIndex>> {
        let mut stmt = self
            .conn
            .prepare("SELECT difficulty FROM rounds ORDER BY id DESC LIMIT 1")?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(Some(DifficultyIndex::clipped(row.get(0)?))),
            None => Ok(None),
        }
    }

    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM rounds", [])?;
        Ok(())
    }

    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let entries = self.all()?;
        let mut writer = csv::Writer::from_path(path)?;
        for entry in &entries {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(error_rate: f64, focus_score: f64, difficulty: f64) -> HistoryEntry {
        let signal = Signal::new(error_rate, 90.0, focus_score).unwrap();
        HistoryEntry::new(&signal, DifficultyIndex::clipped(difficulty))
    }

    #[test]
    fn session_history_appends_in_order() {
        let mut history = SessionHistory::default();
        assert!(history.is_empty());
        assert!(history.summary().is_none());

        history.push(entry(0.1, 0.9, 0.8));
        history.push(entry(0.4, 0.5, 0.4));
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().difficulty.value(), 0.4);

        let summary = history.summary().unwrap();
        assert_eq!(summary.rounds, 2);
        assert!((summary.mean_difficulty - 0.6).abs() < 1e-12);
        assert!((summary.difficulty_std_dev - 0.2).abs() < 1e-12);
    }

    #[test]
    fn record_and_read_back() {
        let db = HistoryDb::open_in_memory().unwrap();
        assert!(db.latest_difficulty().unwrap().is_none());

        let first = entry(0.1, 0.9, 0.8);
        let second = entry(0.5, 0.2, 0.1);
        db.record(&first).unwrap();
        db.record(&second).unwrap();

        let all = db.all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].error_rate, 0.1);
        assert_eq!(all[1].focus_score, 0.2);
        assert_eq!(all[0].timestamp.timestamp(), first.timestamp.timestamp());
        assert_eq!(db.latest_difficulty().unwrap().unwrap().value(), 0.1);

        db.clear().unwrap();
        assert!(db.all().unwrap().is_empty());
    }

    #[test]
    fn file_db_persists_between_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("history.db");
        {
            let db = HistoryDb::open(&path).unwrap();
            db.record(&entry(0.2, 0.6, 0.5)).unwrap();
        }
        let db = HistoryDb::open(&path).unwrap();
        assert_eq!(db.all().unwrap().len(), 1);
    }

    #[test]
    fn export_writes_header_and_rows() {
        let dir = tempdir().unwrap();
        let db = HistoryDb::open_in_memory().unwrap();
        db.record(&entry(0.1, 0.9, 0.8)).unwrap();
        db.record(&entry(0.3, 0.5, 0.45)).unwrap();

        let out = dir.path().join("history.csv");
        assert_eq!(db.export_csv(&out).unwrap(), 2);

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,error_rate,wpm,focus_score,difficulty")
        );
        assert!(lines.next().unwrap().ends_with(",0.1,90.0,0.9,0.8"));
        assert_eq!(lines.count(), 1);
    }
}
