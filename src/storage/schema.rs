//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the odds database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site TEXT NOT NULL,
    listing_url TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    matches_stored INTEGER NOT NULL DEFAULT 0,
    matches_failed INTEGER NOT NULL DEFAULT 0
);

-- One row per extracted match page
CREATE TABLE IF NOT EXISTS matches (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_a TEXT NOT NULL,
    team_b TEXT NOT NULL,
    start_time TEXT NOT NULL,
    tournament TEXT NOT NULL,
    url TEXT NOT NULL,
    extracted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_matches_url ON matches(url);

-- Betting markets of a match
CREATE TABLE IF NOT EXISTS bets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    match_id INTEGER NOT NULL REFERENCES matches(id),
    kind TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bets_match ON bets(match_id);

-- Outcomes of a market, kept in page order
CREATE TABLE IF NOT EXISTS bet_options (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    bet_id INTEGER NOT NULL REFERENCES bets(id),
    position INTEGER NOT NULL,
    label TEXT NOT NULL,
    price TEXT NOT NULL,
    UNIQUE(bet_id, position)
);

CREATE INDEX IF NOT EXISTS idx_bet_options_bet ON bet_options(bet_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
