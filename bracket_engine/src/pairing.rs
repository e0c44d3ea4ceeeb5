//! Swiss pairing generator.
//!
//! Pairs entrants with equal or nearby scores while never repeating a
//! pairing. Ranking is score descending, then seed ascending. Pairing walks
//! the ranking top-down and matches each unpaired entrant with the nearest
//! compatible one below it, backtracking when a choice leaves the rest
//! unpairable.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::bracket::models::{Match, MatchSet, MatchStatus, ResultKind};
use crate::errors::{BracketError, BracketResult};
use crate::seeding::EntrantId;

/// Where an entrant stands going into a Swiss round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwissStanding {
    pub entrant: EntrantId,
    pub seed: u32,
    /// Match points: one per win, byes included
    pub score: u32,
    /// Played or forfeited losses
    pub losses: u32,
    pub byes: u32,
}

/// Pairings already played
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    pairs: HashSet<(EntrantId, EntrantId)>,
}

impl PairHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &str, b: &str) -> (EntrantId, EntrantId) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }

    pub fn record(&mut self, a: &str, b: &str) {
        self.pairs.insert(Self::key(a, b));
    }

    pub fn contains(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Every pairing with two concrete entrants, played or not
    pub fn from_matches<'a>(matches: impl IntoIterator<Item = &'a Match>) -> Self {
        let mut history = Self::new();
        for m in matches {
            if let Some((a, b)) = m.entrants() {
                history.record(a, b);
            }
        }
        history
    }
}

/// One line of a generated round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pairing {
    /// `a` is the higher-ranked entrant
    Match { a: EntrantId, b: EntrantId },
    Bye(EntrantId),
}

/// Current Swiss standings of a match set, in seed order.
pub fn swiss_standings(set: &MatchSet) -> Vec<SwissStanding> {
    let mut standings: Vec<SwissStanding> = set
        .seeds()
        .iter()
        .map(|s| SwissStanding {
            entrant: s.entrant.id.clone(),
            seed: s.seed,
            score: 0,
            losses: 0,
            byes: 0,
        })
        .collect();

    let index: HashMap<&str, usize> = set
        .seeds()
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.entrant.id.as_str(), idx))
        .collect();

    for m in set.matches() {
        if m.status != MatchStatus::Completed {
            continue;
        }
        let (Some(result), Some(winner)) = (m.result, m.winner()) else {
            continue;
        };
        if let Some(&idx) = index.get(winner.as_str()) {
            standings[idx].score += 1;
            if result.kind == ResultKind::Bye {
                standings[idx].byes += 1;
            }
        }
        if let Some(&idx) = m.loser().and_then(|loser| index.get(loser.as_str())) {
            standings[idx].losses += 1;
        }
    }

    standings
}

/// Generate pairings for a Swiss round.
///
/// With an odd field one entrant gets a bye: the lowest-ranked among those
/// with the fewest byes so far, moving up the ranking if that choice leaves
/// the rest unpairable.
///
/// # Errors
///
/// * `InvalidEntrantCount` - fewer than two entrants
/// * `NoValidPairing` - every pairing would repeat an earlier one
pub fn generate_round(
    standings: &[SwissStanding],
    history: &PairHistory,
    round: u32,
) -> BracketResult<Vec<Pairing>> {
    if standings.len() < 2 {
        return Err(BracketError::InvalidEntrantCount {
            format: "swiss".to_string(),
            count: standings.len(),
        });
    }

    let mut ranked: Vec<&SwissStanding> = standings.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.seed.cmp(&b.seed)));

    if ranked.len() % 2 == 0 {
        return pair_all(&ranked, history)
            .map(|pairs| to_pairings(&ranked, &pairs))
            .ok_or(BracketError::NoValidPairing { round });
    }

    let mut candidates: Vec<usize> = (0..ranked.len()).collect();
    candidates.sort_by_key(|&idx| (ranked[idx].byes, std::cmp::Reverse(idx)));

    for bye in candidates {
        let mut rest = ranked.clone();
        let sitting_out = rest.remove(bye);

        if let Some(pairs) = pair_all(&rest, history) {
            let mut pairings = to_pairings(&rest, &pairs);
            pairings.push(Pairing::Bye(sitting_out.entrant.clone()));
            return Ok(pairings);
        }
    }

    Err(BracketError::NoValidPairing { round })
}

fn to_pairings(ranked: &[&SwissStanding], pairs: &[(usize, usize)]) -> Vec<Pairing> {
    pairs
        .iter()
        .map(|&(top, other)| Pairing::Match {
            a: ranked[top].entrant.clone(),
            b: ranked[other].entrant.clone(),
        })
        .collect()
}

fn pair_all(ranked: &[&SwissStanding], history: &PairHistory) -> Option<Vec<(usize, usize)>> {
    let mut paired = vec![false; ranked.len()];
    let mut pairs = Vec::with_capacity(ranked.len() / 2);
    backtrack(ranked, history, &mut paired, &mut pairs).then_some(pairs)
}

fn backtrack(
    ranked: &[&SwissStanding],
    history: &PairHistory,
    paired: &mut [bool],
    pairs: &mut Vec<(usize, usize)>,
) -> bool {
    let Some(top) = paired.iter().position(|p| !p) else {
        return true;
    };
    paired[top] = true;

    for candidate in top + 1..ranked.len() {
        if paired[candidate] || history.contains(&ranked[top].entrant, &ranked[candidate].entrant) {
            continue;
        }

        paired[candidate] = true;
        pairs.push((top, candidate));
        if backtrack(ranked, history, paired, pairs) {
            return true;
        }
        pairs.pop();
        paired[candidate] = false;
    }

    paired[top] = false;
    false
}
