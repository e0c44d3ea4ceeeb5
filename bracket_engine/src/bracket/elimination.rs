//! Single and double elimination brackets.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::calculator::{self, FormatSummary};
use crate::config::BracketFormat;
use crate::errors::BracketResult;
use crate::progression::{Progress, settle};
use crate::seeding::{EntrantId, bracket_order};

use super::formats::FormatStrategy;
use super::models::{MatchId, MatchSet, Outcome, Segment, Side, Slot};

/// One loss and out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleElimination;

/// Two losses and out, with an upper and a lower bracket meeting in a grand
/// final
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleElimination {
    /// Play a second grand final if the lower-bracket champion wins the first
    pub bracket_reset: bool,
}

impl Default for DoubleElimination {
    fn default() -> Self {
        Self {
            bracket_reset: true,
        }
    }
}

impl FormatStrategy for SingleElimination {
    fn kind(&self) -> BracketFormat {
        BracketFormat::SingleElimination
    }

    fn summary(&self, entrants: usize) -> BracketResult<FormatSummary> {
        calculator::single_elimination(entrants)
    }

    fn populate(&self, set: &mut MatchSet, _rng: &mut dyn RngCore) -> BracketResult<()> {
        build_upper(set)?;
        Ok(())
    }

    fn on_finished(
        &self,
        set: &mut MatchSet,
        id: MatchId,
        progress: &mut Progress,
    ) -> BracketResult<()> {
        note_elimination(set, id, progress)
    }

    fn champion(&self, set: &MatchSet) -> Option<EntrantId> {
        let rounds = set.rounds(Segment::Upper);
        set.find(Segment::Upper, rounds, 1)
            .filter(|m| m.is_finished())
            .and_then(|m| m.winner().cloned())
    }
}

impl FormatStrategy for DoubleElimination {
    fn kind(&self) -> BracketFormat {
        BracketFormat::DoubleElimination
    }

    fn summary(&self, entrants: usize) -> BracketResult<FormatSummary> {
        calculator::double_elimination(entrants)
    }

    fn populate(&self, set: &mut MatchSet, _rng: &mut dyn RngCore) -> BracketResult<()> {
        let upper = build_upper(set)?;
        let lower_final = build_lower(set, &upper)?;

        let Some(&upper_final) = upper.last().and_then(|round| round.first()) else {
            return Ok(());
        };

        // Two entrants: no lower bracket, the upper final's loser goes straight
        // to the grand final.
        let challenger = match lower_final {
            Some(id) => Slot::feed(id, Outcome::Winner),
            None => Slot::feed(upper_final, Outcome::Loser),
        };

        set.push(
            Segment::GrandFinal,
            1,
            1,
            Slot::feed(upper_final, Outcome::Winner),
            challenger,
        )?;
        Ok(())
    }

    fn on_finished(
        &self,
        set: &mut MatchSet,
        id: MatchId,
        progress: &mut Progress,
    ) -> BracketResult<()> {
        let m = set.get(id)?;
        let lower_champion_won = m.segment == Segment::GrandFinal
            && m.round == 1
            && m.is_decided()
            && m.result.is_some_and(|r| r.winner == Side::B);

        if lower_champion_won && self.bracket_reset {
            let (upper_champion, lower_champion) = (m.slot_a.clone(), m.slot_b.clone());
            let reset = set.push(Segment::GrandFinal, 2, 1, upper_champion, lower_champion)?;
            log::info!("Lower bracket champion took the grand final, reset match {} created", reset);
            progress.created.push(reset);
            return settle(set, reset, progress);
        }

        note_elimination(set, id, progress)
    }

    fn champion(&self, set: &MatchSet) -> Option<EntrantId> {
        let grand_final = set.find(Segment::GrandFinal, 1, 1)?;
        if !grand_final.is_finished() {
            return None;
        }

        match set.find(Segment::GrandFinal, 2, 1) {
            Some(reset) if reset.is_finished() => reset.winner().cloned(),
            Some(_) => None,
            None => grand_final.winner().cloned(),
        }
    }
}

/// Record the loser of a decided match with nowhere left to go.
fn note_elimination(set: &MatchSet, id: MatchId, progress: &mut Progress) -> BracketResult<()> {
    let m = set.get(id)?;
    if m.loser_to.is_none() && m.is_decided() {
        if let Some(loser) = m.loser() {
            progress.eliminated.push(loser.clone());
        }
    }
    Ok(())
}

/// Build the upper bracket and return its match IDs by round.
///
/// Round one follows the standard placement order, so seeds 1 and 2 can only
/// meet in the final and seeds beyond the field become byes.
fn build_upper(set: &mut MatchSet) -> BracketResult<Vec<Vec<MatchId>>> {
    let size = calculator::bracket_size(set.entrant_count());

    let lines: Vec<Slot> = bracket_order(size)
        .into_iter()
        .map(|seed| {
            set.seeds()
                .get(seed as usize - 1)
                .map(|s| Slot::Entrant(s.entrant.id.clone()))
                .unwrap_or(Slot::Bye)
        })
        .collect();

    let opening = lines
        .chunks(2)
        .enumerate()
        .map(|(idx, pair)| {
            set.push(
                Segment::Upper,
                1,
                idx as u32 + 1,
                pair[0].clone(),
                pair[1].clone(),
            )
        })
        .collect::<BracketResult<Vec<_>>>()?;

    let mut rounds = vec![opening];
    let mut round = 1;
    while let Some(previous) = rounds.last().filter(|r| r.len() > 1).cloned() {
        round += 1;
        let next = previous
            .chunks(2)
            .enumerate()
            .map(|(idx, pair)| {
                set.push(
                    Segment::Upper,
                    round,
                    idx as u32 + 1,
                    Slot::feed(pair[0], Outcome::Winner),
                    Slot::feed(pair[1], Outcome::Winner),
                )
            })
            .collect::<BracketResult<Vec<_>>>()?;
        rounds.push(next);
    }

    Ok(rounds)
}

/// Build the lower bracket and return its final, if there is one.
///
/// Lower round 1 pairs upper round-1 losers. After that, drop rounds (even)
/// meet lower survivors against the losers of the next upper round, and
/// consolidation rounds (odd) halve the field. Drops are crossed with their
/// neighbour (position `p` lands on `p ^ 1`) so a dropped entrant does not
/// meet someone it beat in the upper bracket; the single-match drop of the
/// upper final cannot be crossed.
fn build_lower(set: &mut MatchSet, upper: &[Vec<MatchId>]) -> BracketResult<Option<MatchId>> {
    let Some(opening) = upper.first().filter(|_| upper.len() >= 2) else {
        return Ok(None);
    };

    let mut round = 1;
    let mut survivors = opening
        .chunks(2)
        .enumerate()
        .map(|(idx, pair)| {
            set.push(
                Segment::Lower,
                round,
                idx as u32 + 1,
                Slot::feed(pair[0], Outcome::Loser),
                Slot::feed(pair[1], Outcome::Loser),
            )
        })
        .collect::<BracketResult<Vec<_>>>()?;

    for (stage, drops) in upper.iter().enumerate().skip(1) {
        round += 1;
        let crossed = drops.len() >= 2;
        survivors = survivors
            .iter()
            .enumerate()
            .map(|(idx, &survivor)| {
                let dropped = if crossed { drops[idx ^ 1] } else { drops[idx] };
                set.push(
                    Segment::Lower,
                    round,
                    idx as u32 + 1,
                    Slot::feed(survivor, Outcome::Winner),
                    Slot::feed(dropped, Outcome::Loser),
                )
            })
            .collect::<BracketResult<Vec<_>>>()?;

        if stage + 1 < upper.len() {
            round += 1;
            survivors = survivors
                .chunks(2)
                .enumerate()
                .map(|(idx, pair)| {
                    set.push(
                        Segment::Lower,
                        round,
                        idx as u32 + 1,
                        Slot::feed(pair[0], Outcome::Winner),
                        Slot::feed(pair[1], Outcome::Winner),
                    )
                })
                .collect::<BracketResult<Vec<_>>>()?;
        }
    }

    Ok(survivors.first().copied())
}
