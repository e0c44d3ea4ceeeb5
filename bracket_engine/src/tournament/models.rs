//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bracket::{BracketStatus, BracketSummary, MatchSet};
use crate::config::BracketConfig;

/// Tournament ID type
pub type TournamentId = i64;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TournamentState {
    /// Bracket generated, matches being played
    Running,
    /// Champion decided
    Finished,
}

impl From<BracketStatus> for TournamentState {
    fn from(status: BracketStatus) -> Self {
        match status {
            BracketStatus::InProgress => TournamentState::Running,
            BracketStatus::Completed => TournamentState::Finished,
        }
    }
}

/// A stored bracket with its configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentRecord {
    pub id: TournamentId,
    pub config: BracketConfig,
    pub bracket: MatchSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TournamentRecord {
    /// Create a new record for a freshly built bracket
    pub fn new(id: TournamentId, config: BracketConfig, bracket: MatchSet) -> Self {
        let now = Utc::now();
        Self {
            id,
            config,
            bracket,
            created_at: now,
            updated_at: now,
        }
    }

    /// Summarize for listing
    pub fn info(&self) -> TournamentInfo {
        TournamentInfo {
            id: self.id,
            state: self.bracket.status().into(),
            config: self.config.clone(),
            summary: self.bracket.summary(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Tournament information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub id: TournamentId,
    pub state: TournamentState,
    pub config: BracketConfig,
    pub summary: BracketSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
