//! Storage traits and error types
//!
//! This module defines the persistence contract adapters write through and
//! the error type shared by every storage backend.

use crate::model::{Bet, Match};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage connection lock poisoned")]
    Poisoned,

    #[error("Run not found: {0}")]
    RunNotFound(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence contract for extracted records
///
/// Implementations are shared by every extraction task of a crawl, so they
/// must tolerate concurrent calls from multiple tasks.
pub trait Repository: Send + Sync {
    /// Persists a match
    ///
    /// # Arguments
    ///
    /// * `game` - The match to store
    ///
    /// # Returns
    ///
    /// The generated match ID, used to attach bets
    fn insert_match(&self, game: &Match) -> StorageResult<i64>;

    /// Persists one bet, with all of its options, against a stored match
    ///
    /// # Arguments
    ///
    /// * `match_id` - ID returned by [`Repository::insert_match`]
    /// * `bet` - The market and its options, in page order
    ///
    /// # Returns
    ///
    /// The generated bet ID
    fn insert_bet(&self, match_id: i64, bet: &Bet) -> StorageResult<i64>;
}
