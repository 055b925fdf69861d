/// Extraction state definitions for tracking one adapter invocation
///
/// Every `extract_match` call walks `Idle → Rendering → Extracting →
/// Persisting → Done`, and may drop to `Failed` from any non-terminal state.
use std::fmt;

/// The stage an adapter invocation has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionState {
    // ===== Active States =====
    /// Invocation created, nothing requested yet
    Idle,

    /// Page is being rendered by the backend
    Rendering,

    /// Rendered HTML is being queried for match data
    Extracting,

    /// Match and bets are being written to the repository
    Persisting,

    // ===== Terminal States =====
    /// Match and all its bets were persisted
    Done,

    /// Invocation aborted; nothing further happens for this URL
    Failed,
}

impl ExtractionState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the invocation may still make progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: ExtractionState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Rendering)
            | (Self::Rendering, Self::Extracting)
            | (Self::Extracting, Self::Persisting)
            | (Self::Persisting, Self::Done) => true,
            (current, Self::Failed) => current.is_active(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Rendering => "rendering",
            Self::Extracting => "extracting",
            Self::Persisting => "persisting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one invocation through its states, logging each step
#[derive(Debug)]
pub struct ExtractionProgress<'a> {
    site: &'static str,
    url: &'a str,
    state: ExtractionState,
}

impl<'a> ExtractionProgress<'a> {
    pub fn new(site: &'static str, url: &'a str) -> Self {
        Self {
            site,
            url,
            state: ExtractionState::Idle,
        }
    }

    /// Moves to `next`; illegal transitions are programming errors
    pub fn advance(&mut self, next: ExtractionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal extraction transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(site = self.site, url = self.url, from = %self.state, to = %next, "Extraction step");
        self.state = next;
    }

    pub fn state(&self) -> ExtractionState {
        self.state
    }
}
