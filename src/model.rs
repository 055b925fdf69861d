//! Records extracted from bookmaker pages
//!
//! A crawl is write-once: a `Match` is built from one match page, persisted,
//! and then each of its `Bet`s is persisted against the generated match id.

use chrono::{DateTime, Utc};

/// One match as shown on a bookmaker's match page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// First team, as the site lists it
    pub team_a: String,

    /// Second team
    pub team_b: String,

    /// Kickoff time; always concrete (the date normalizer falls back to "now")
    pub start_time: DateTime<Utc>,

    /// Tournament name, empty when the page does not show one
    pub tournament: String,

    /// Match page the record was extracted from
    pub url: String,
}

/// A betting market on a match, e.g. "Match Winner"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bet {
    /// Market name
    pub kind: String,

    /// Outcomes in page order; may be empty
    pub options: Vec<BetOption>,
}

/// A single wagering outcome within a market
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetOption {
    pub label: String,

    /// Displayed price, kept verbatim since sites format odds inconsistently
    pub price: String,
}

impl BetOption {
    pub fn new(label: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            price: price.into(),
        }
    }
}
