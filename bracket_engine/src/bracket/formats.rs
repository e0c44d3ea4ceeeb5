//! Format strategies.
//!
//! Each competition format is a small strategy value; [`Format`] dispatches to
//! them statically so a match set can carry its format by value and
//! serialize it.

use enum_dispatch::enum_dispatch;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::calculator::FormatSummary;
use crate::config::BracketFormat;
use crate::errors::BracketResult;
use crate::progression::Progress;
use crate::seeding::EntrantId;

use super::models::{MatchId, MatchSet};

pub use super::elimination::{DoubleElimination, SingleElimination};
pub use super::round_robin::RoundRobin;
pub use super::swiss::Swiss;

/// Behaviour that differs between competition formats
#[enum_dispatch]
pub trait FormatStrategy {
    fn kind(&self) -> BracketFormat;

    /// Shape of the bracket for `entrants`, rejecting field sizes the format
    /// cannot run
    fn summary(&self, entrants: usize) -> BracketResult<FormatSummary>;

    /// Create the initial matches of an empty set
    fn populate(&self, set: &mut MatchSet, rng: &mut dyn RngCore) -> BracketResult<()>;

    /// Format-specific follow-up after a match finished and its participants
    /// were moved along their links
    fn on_finished(
        &self,
        set: &mut MatchSet,
        id: MatchId,
        progress: &mut Progress,
    ) -> BracketResult<()>;

    /// Champion, once the deciding match (or round) is finished
    fn champion(&self, set: &MatchSet) -> Option<EntrantId>;
}

/// Format carried by a match set
#[enum_dispatch(FormatStrategy)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    SingleElimination(SingleElimination),
    DoubleElimination(DoubleElimination),
    RoundRobin(RoundRobin),
    Swiss(Swiss),
}
