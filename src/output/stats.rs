//! Statistics generation from the odds database
//!
//! This module provides functionality for extracting and displaying
//! stored match, bet and run statistics from the storage layer.

use crate::storage::{RunRecord, SqliteStorage, StorageResult};

/// Odds database statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored matches
    pub matches: u64,

    /// Total number of stored bets (markets)
    pub bets: u64,

    /// Total number of stored bet options
    pub options: u64,

    /// Most recently started crawl run, if any
    pub latest_run: Option<RunRecord>,
}

impl CrawlStatistics {
    /// Average number of markets per stored match
    pub fn bets_per_match(&self) -> f64 {
        if self.matches == 0 {
            0.0
        } else {
            self.bets as f64 / self.matches as f64
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(storage: &SqliteStorage) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        matches: storage.count_matches()?,
        bets: storage.count_bets()?,
        options: storage.count_options()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Odds Statistics ===\n");

    println!("Overview:");
    println!("  Matches stored: {}", stats.matches);
    println!(
        "  Bets stored: {} ({:.1} per match)",
        stats.bets,
        stats.bets_per_match()
    );
    println!("  Options stored: {}", stats.options);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run (#{}):", run.id);
            println!("  Site: {}", run.site);
            println!("  Listing: {}", run.listing_url);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished_at) = &run.finished_at {
                println!("  Finished: {}", finished_at);
            }
            println!(
                "  Matches: {} stored, {} failed",
                run.matches_stored, run.matches_failed
            );
            println!("  Config hash: {}", run.config_hash);
        }
        None => println!("No crawl runs recorded yet."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bet, BetOption, Match};
    use crate::storage::{Repository, RunStatus};
    use chrono::Utc;

    #[test]
    fn test_load_statistics_empty() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage).unwrap();

        assert_eq!(stats.matches, 0);
        assert_eq!(stats.bets_per_match(), 0.0);
        assert!(stats.latest_run.is_none());
    }

    #[test]
    fn test_load_statistics_counts() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("leon", "https://leon.ru/bets", "abc").unwrap();

        let game = Match {
            team_a: "Team Spirit".to_string(),
            team_b: "Team Liquid".to_string(),
            start_time: Utc::now(),
            tournament: "TI".to_string(),
            url: "https://leon.ru/m/1".to_string(),
        };
        let match_id = storage.insert_match(&game).unwrap();
        for kind in ["Winner", "First blood"] {
            let bet = Bet {
                kind: kind.to_string(),
                options: vec![BetOption::new("Team Spirit", "1.5"), BetOption::new("Team Liquid", "2.5")],
            };
            storage.insert_bet(match_id, &bet).unwrap();
        }
        storage.finish_run(run_id, RunStatus::Completed, 1, 0).unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.bets, 2);
        assert_eq!(stats.options, 4);
        assert_eq!(stats.bets_per_match(), 2.0);

        let run = stats.latest_run.unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.matches_stored, 1);
    }
}
