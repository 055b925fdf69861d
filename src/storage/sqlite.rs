//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Repository trait,
//! plus the run bookkeeping and read-back queries used by the stats report.

use crate::model::{Bet, BetOption, Match};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Repository, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// The connection sits behind a mutex so a single handle can be shared by all
/// extraction tasks of a crawl.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `site` - Site the run crawls
    /// * `listing_url` - Listing page the run starts from
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    pub fn create_run(&self, site: &str, listing_url: &str, config_hash: &str) -> StorageResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO runs (site, listing_url, started_at, config_hash, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                site,
                listing_url,
                now,
                config_hash,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Marks a run as finished and records how many matches it stored and lost
    pub fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        matches_stored: u64,
        matches_failed: u64,
    ) -> StorageResult<()> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let updated = conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, matches_stored = ?3, matches_failed = ?4
             WHERE id = ?5",
            params![
                status.to_db_string(),
                now,
                matches_stored,
                matches_failed,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, site, listing_url, started_at, finished_at, config_hash, status,
                    matches_stored, matches_failed
             FROM runs WHERE id = ?1",
            params![run_id],
            run_from_row,
        )
        .optional()?
        .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Gets the most recent run
    pub fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, site, listing_url, started_at, finished_at, config_hash, status,
                        matches_stored, matches_failed
                 FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Read-back =====

    /// Gets a stored match by ID
    pub fn get_match(&self, match_id: i64) -> StorageResult<Option<Match>> {
        let conn = self.lock()?;
        let game = conn
            .query_row(
                "SELECT team_a, team_b, start_time, tournament, url FROM matches WHERE id = ?1",
                params![match_id],
                |row| {
                    Ok(Match {
                        team_a: row.get(0)?,
                        team_b: row.get(1)?,
                        start_time: timestamp_at(row, 2)?,
                        tournament: row.get(3)?,
                        url: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(game)
    }

    /// Gets all bets of a match, in insertion order, with options in page order
    pub fn get_bets(&self, match_id: i64) -> StorageResult<Vec<Bet>> {
        let conn = self.lock()?;

        let mut bet_stmt = conn.prepare("SELECT id, kind FROM bets WHERE match_id = ?1 ORDER BY id")?;
        let mut option_stmt = conn.prepare(
            "SELECT label, price FROM bet_options WHERE bet_id = ?1 ORDER BY position",
        )?;

        let rows = bet_stmt.query_map(params![match_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut bets = Vec::new();
        for row in rows {
            let (bet_id, kind) = row?;
            let options = option_stmt
                .query_map(params![bet_id], |row| {
                    Ok(BetOption {
                        label: row.get(0)?,
                        price: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            bets.push(Bet { kind, options });
        }

        Ok(bets)
    }

    // ===== Statistics =====

    /// Gets total match count
    pub fn count_matches(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM matches")
    }

    /// Gets total bet count
    pub fn count_bets(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM bets")
    }

    /// Gets total option count
    pub fn count_options(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM bet_options")
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Repository for SqliteStorage {
    fn insert_match(&self, game: &Match) -> StorageResult<i64> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO matches (team_a, team_b, start_time, tournament, url, extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                game.team_a,
                game.team_b,
                game.start_time.to_rfc3339(),
                game.tournament,
                game.url,
                now
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn insert_bet(&self, match_id: i64, bet: &Bet) -> StorageResult<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO bets (match_id, kind) VALUES (?1, ?2)",
            params![match_id, bet.kind],
        )?;
        let bet_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO bet_options (bet_id, position, label, price) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, option) in bet.options.iter().enumerate() {
                stmt.execute(params![bet_id, position as i64, option.label, option.price])?;
            }
        }

        tx.commit()?;
        Ok(bet_id)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        site: row.get(1)?,
        listing_url: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        config_hash: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Failed),
        matches_stored: row.get::<_, i64>(7)? as u64,
        matches_failed: row.get::<_, i64>(8)? as u64,
    })
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    raw.parse::<DateTime<Utc>>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
