//! Swiss system: a fixed number of rounds, each paired from the standings
//! after the previous one.
//!
//! With qualification or elimination thresholds set, entrants that reach one
//! stop being paired, and the event ends early once the active field can no
//! longer make a round.

use log::{info, warn};
use rand::{RngCore, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::calculator::{self, FormatSummary};
use crate::config::{BracketFormat, SwissPairing};
use crate::errors::{BracketError, BracketResult};
use crate::pairing::{self, PairHistory, Pairing, SwissStanding};
use crate::progression::{Progress, settle};
use crate::seeding::EntrantId;
use crate::standings;

use super::formats::FormatStrategy;
use super::models::{MatchId, MatchSet, Segment, Slot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swiss {
    /// Rounds to play; ceil(log2 N) when unset
    pub rounds: Option<u32>,
    /// Pairing method for round one
    pub first_round: SwissPairing,
    /// Match points that qualify an entrant
    #[serde(default)]
    pub qualify_at: Option<u32>,
    /// Losses that eliminate an entrant
    #[serde(default)]
    pub eliminate_at: Option<u32>,
}

/// Whether an entrant is still being paired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwissResolution {
    Active,
    Qualified,
    Eliminated,
}

impl Swiss {
    /// Resolution for a record; qualification is checked first.
    pub fn resolution(&self, points: u32, losses: u32) -> SwissResolution {
        if self.qualify_at.is_some_and(|wins| points >= wins) {
            SwissResolution::Qualified
        } else if self.eliminate_at.is_some_and(|limit| losses >= limit) {
            SwissResolution::Eliminated
        } else {
            SwissResolution::Active
        }
    }

    fn resolves_early(&self) -> bool {
        self.qualify_at.is_some() || self.eliminate_at.is_some()
    }

    /// Round-one pairings from the seed order. An odd field gives the bye to
    /// the lowest seed.
    fn opening(&self, mut order: Vec<EntrantId>, rng: &mut dyn RngCore) -> Vec<Pairing> {
        let bye = (order.len() % 2 == 1).then(|| order.pop()).flatten();

        let pairs: Vec<(EntrantId, EntrantId)> = match self.first_round {
            SwissPairing::Adjacent => adjacent(order),
            SwissPairing::Folding => {
                let lower = order.split_off(order.len() / 2);
                order.into_iter().zip(lower).collect()
            }
            SwissPairing::Random => {
                order.shuffle(rng);
                adjacent(order)
            }
        };

        pairs
            .into_iter()
            .map(|(a, b)| Pairing::Match { a, b })
            .chain(bye.map(Pairing::Bye))
            .collect()
    }
}

fn adjacent(order: Vec<EntrantId>) -> Vec<(EntrantId, EntrantId)> {
    let mut pairs = Vec::with_capacity(order.len() / 2);
    let mut iter = order.into_iter();
    while let (Some(a), Some(b)) = (iter.next(), iter.next()) {
        pairs.push((a, b));
    }
    pairs
}

/// Create the matches of one round
fn push_round(
    set: &mut MatchSet,
    round: u32,
    pairings: Vec<Pairing>,
) -> BracketResult<Vec<MatchId>> {
    pairings
        .into_iter()
        .enumerate()
        .map(|(idx, pairing)| {
            let (slot_a, slot_b) = match pairing {
                Pairing::Match { a, b } => (Slot::Entrant(a), Slot::Entrant(b)),
                Pairing::Bye(a) => (Slot::Entrant(a), Slot::Bye),
            };
            set.push(Segment::Swiss, round, idx as u32 + 1, slot_a, slot_b)
        })
        .collect()
}

impl FormatStrategy for Swiss {
    fn kind(&self) -> BracketFormat {
        BracketFormat::Swiss
    }

    fn summary(&self, entrants: usize) -> BracketResult<FormatSummary> {
        calculator::swiss_with_rounds(entrants, self.rounds)
    }

    fn populate(&self, set: &mut MatchSet, rng: &mut dyn RngCore) -> BracketResult<()> {
        let total_rounds = self.summary(set.entrant_count())?.rounds;
        set.start_swiss(total_rounds);

        let order = set.seeds().iter().map(|s| s.entrant.id.clone()).collect();
        push_round(set, 1, self.opening(order, rng))?;
        Ok(())
    }

    /// Pair the next round once every match of the current one is finished.
    fn on_finished(
        &self,
        set: &mut MatchSet,
        id: MatchId,
        progress: &mut Progress,
    ) -> BracketResult<()> {
        let Some(state) = set.swiss_progress() else {
            return Ok(());
        };
        if set.get(id)?.round != state.current_round || state.current_round >= state.total_rounds {
            return Ok(());
        }

        let current = set.round(Segment::Swiss, state.current_round);
        if current.iter().any(|m| !m.is_finished()) {
            return Ok(());
        }

        let next = state.current_round + 1;
        let active: Vec<SwissStanding> = pairing::swiss_standings(set)
            .into_iter()
            .filter(|s| self.resolution(s.score, s.losses) == SwissResolution::Active)
            .collect();

        if active.len() < 2 {
            info!(
                "Swiss ends after round {}: {} entrants left to pair",
                state.current_round,
                active.len()
            );
            set.end_swiss_early();
            return Ok(());
        }

        let history = PairHistory::from_matches(set.matches());
        let pairings = match pairing::generate_round(&active, &history, next) {
            Ok(pairings) => pairings,
            Err(BracketError::NoValidPairing { .. }) if self.resolves_early() => {
                warn!(
                    "Swiss ends after round {}: {} active entrants have all met",
                    state.current_round,
                    active.len()
                );
                set.end_swiss_early();
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        set.advance_swiss_round();
        let created = push_round(set, next, pairings)?;
        info!("Swiss round {} paired: {} matches", next, created.len());

        for id in created {
            progress.created.push(id);
            settle(set, id, progress)?;
        }
        Ok(())
    }

    fn champion(&self, set: &MatchSet) -> Option<EntrantId> {
        let state = set.swiss_progress()?;
        if state.current_round < state.total_rounds
            || set
                .round(Segment::Swiss, state.current_round)
                .iter()
                .any(|m| !m.is_finished())
        {
            return None;
        }

        standings::standings(set)
            .into_iter()
            .next()
            .map(|standing| standing.entrant)
    }
}
