//! Progression engine: records results and pushes their consequences
//! through the match graph.
//!
//! Every call works on a private copy of the match set and only replaces the
//! caller's set once the whole cascade succeeded, so a failed call leaves the
//! set exactly as it was.

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

use crate::bracket::formats::FormatStrategy;
use crate::bracket::models::{
    Match, MatchId, MatchResult, MatchSet, MatchStatus, Outcome, ResultKind, Side, Slot,
};
use crate::errors::{BracketError, BracketResult};
use crate::seeding::EntrantId;

/// What a single result changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionOutcome {
    /// Match the result was recorded on
    pub match_id: MatchId,
    pub winner: EntrantId,
    pub loser: EntrantId,
    pub kind: ResultKind,
    /// Matches whose slots were filled by this step
    pub updated: Vec<MatchId>,
    /// Matches created by this step (bracket reset, next Swiss round)
    pub created: Vec<MatchId>,
    /// Matches completed automatically as walkovers or cancelled
    pub auto_completed: Vec<MatchId>,
    /// Entrants knocked out of an elimination bracket
    pub eliminated: Vec<EntrantId>,
    /// Whether this result finished the bracket
    pub completed: bool,
    pub champion: Option<EntrantId>,
}

/// Bookkeeping for one progression step.
#[derive(Debug, Default)]
pub struct Progress {
    queue: VecDeque<MatchId>,
    pub(crate) updated: BTreeSet<MatchId>,
    pub(crate) created: Vec<MatchId>,
    pub(crate) auto_completed: Vec<MatchId>,
    pub(crate) eliminated: Vec<EntrantId>,
}

impl Progress {
    /// Queue a finished match for propagation
    fn finished(&mut self, id: MatchId) {
        self.queue.push_back(id);
    }

    pub(crate) fn walkovers(&self) -> usize {
        self.auto_completed.len()
    }
}

/// Record a played result.
///
/// # Arguments
///
/// * `set` - Match set to update
/// * `id` - Match the result belongs to
/// * `score_a` - Games won by slot A
/// * `score_b` - Games won by slot B
///
/// # Returns
///
/// Everything that changed downstream of the result
///
/// # Errors
///
/// * `MatchNotFound` - unknown match ID
/// * `MatchNotReady` - match is pending, completed or cancelled
/// * `InvalidScore` - score is not decisive under the match's best-of rule
/// * `NoValidPairing` - the next Swiss round cannot be paired
pub fn apply_result(
    set: &mut MatchSet,
    id: MatchId,
    score_a: u32,
    score_b: u32,
) -> BracketResult<ProgressionOutcome> {
    let best_of = ready_match(set, id)?.best_of;
    let winner = best_of.decide(score_a, score_b)?;

    commit(
        set,
        id,
        MatchResult {
            score_a,
            score_b,
            winner,
            kind: ResultKind::Played,
        },
    )
}

/// Record a forfeit: `winner` advances with the minimum winning score.
pub fn apply_forfeit(
    set: &mut MatchSet,
    id: MatchId,
    winner: Side,
) -> BracketResult<ProgressionOutcome> {
    let best_of = ready_match(set, id)?.best_of;
    let (score_a, score_b) = best_of.walkover_score(winner);

    commit(
        set,
        id,
        MatchResult {
            score_a,
            score_b,
            winner,
            kind: ResultKind::Forfeit,
        },
    )
}

fn ready_match(set: &MatchSet, id: MatchId) -> BracketResult<&Match> {
    let m = set.get(id)?;
    if m.status != MatchStatus::Ready {
        return Err(BracketError::MatchNotReady {
            id,
            status: m.status.to_string(),
        });
    }
    Ok(m)
}

fn commit(
    set: &mut MatchSet,
    id: MatchId,
    result: MatchResult,
) -> BracketResult<ProgressionOutcome> {
    let mut working = set.clone();
    let mut progress = Progress::default();

    let (winner, loser) = {
        let m = working.get_mut(id)?;
        let (a, b) = m
            .entrants()
            .map(|(a, b)| (a.clone(), b.clone()))
            .ok_or_else(|| BracketError::MatchNotReady {
                id,
                status: m.status.to_string(),
            })?;

        m.result = Some(result);
        m.status = MatchStatus::Completed;
        m.completed_at = Some(Utc::now());

        match result.winner {
            Side::A => (a, b),
            Side::B => (b, a),
        }
    };

    debug!(
        "Match {} won by {} ({}-{}, {:?})",
        id, winner, result.score_a, result.score_b, result.kind
    );

    progress.finished(id);
    drain(&mut working, &mut progress)?;

    let outcome = ProgressionOutcome {
        match_id: id,
        winner,
        loser,
        kind: result.kind,
        updated: progress.updated.into_iter().collect(),
        created: progress.created,
        auto_completed: progress.auto_completed,
        eliminated: progress.eliminated,
        completed: working.is_completed(),
        champion: working.champion().cloned(),
    };

    *set = working;
    Ok(outcome)
}

/// Settle every pending match of a freshly built set and propagate the
/// resulting walkovers.
pub(crate) fn settle_new(set: &mut MatchSet) -> BracketResult<Progress> {
    let mut progress = Progress::default();

    let pending: Vec<MatchId> = set
        .matches()
        .iter()
        .filter(|m| m.status == MatchStatus::Pending)
        .map(|m| m.id)
        .collect();

    for id in pending {
        settle(set, id, &mut progress)?;
    }

    drain(set, &mut progress)?;
    Ok(progress)
}

/// Propagate every queued match, then check for a champion.
fn drain(set: &mut MatchSet, progress: &mut Progress) -> BracketResult<()> {
    let format = set.format().clone();

    while let Some(id) = progress.queue.pop_front() {
        advance(set, id, progress)?;
        format.on_finished(set, id, progress)?;
    }

    if set.is_completed() {
        return Ok(());
    }

    if let Some(champion) = format.champion(set) {
        info!("Bracket completed, champion {}", champion);
        set.complete(champion);
    }

    Ok(())
}

/// Move the winner and loser of a finished match into their linked slots.
fn advance(set: &mut MatchSet, id: MatchId, progress: &mut Progress) -> BracketResult<()> {
    for outcome in [Outcome::Winner, Outcome::Loser] {
        let source = set.get(id)?;
        let (Some(link), Some(value)) = (source.link(outcome), source.outcome_slot(outcome)) else {
            continue;
        };

        let target = set.get_mut(link.target)?;
        if *target.slot(link.side) != Slot::feed(id, outcome) {
            return Err(BracketError::AdvancementConflict {
                source_match: id,
                target: format!("match {} side {:?}", link.target, link.side),
            });
        }
        *target.slot_mut(link.side) = value;

        progress.updated.insert(link.target);
        settle(set, link.target, progress)?;
    }

    Ok(())
}

enum Settlement {
    Ready,
    Walkover(Side),
    Cancelled,
}

fn settlement(m: &Match) -> Option<Settlement> {
    match (&m.slot_a, &m.slot_b) {
        (Slot::Entrant(_), Slot::Entrant(_)) => Some(Settlement::Ready),
        (Slot::Entrant(_), Slot::Bye) => Some(Settlement::Walkover(Side::A)),
        (Slot::Bye, Slot::Entrant(_)) => Some(Settlement::Walkover(Side::B)),
        (Slot::Bye, Slot::Bye) => Some(Settlement::Cancelled),
        _ => None,
    }
}

/// Move a pending match on once both slots are resolved.
pub(crate) fn settle(set: &mut MatchSet, id: MatchId, progress: &mut Progress) -> BracketResult<()> {
    let m = set.get_mut(id)?;
    if m.status != MatchStatus::Pending {
        return Ok(());
    }

    match settlement(m) {
        Some(Settlement::Ready) => m.status = MatchStatus::Ready,
        Some(Settlement::Walkover(winner)) => {
            let (score_a, score_b) = m.best_of.walkover_score(winner);
            m.result = Some(MatchResult {
                score_a,
                score_b,
                winner,
                kind: ResultKind::Bye,
            });
            m.status = MatchStatus::Completed;
            m.completed_at = Some(Utc::now());
            progress.auto_completed.push(id);
            progress.finished(id);
        }
        Some(Settlement::Cancelled) => {
            m.status = MatchStatus::Cancelled;
            m.completed_at = Some(Utc::now());
            progress.auto_completed.push(id);
            progress.finished(id);
        }
        None => {}
    }

    Ok(())
}
