//! Standings derived from a match set.
//!
//! Round robin ranks by wins, then game differential, then games won, then
//! seed. Swiss ranks by match points, then Buchholz (sum of opponents'
//! points), then game differential, then seed. Elimination formats rank by
//! how far an entrant got; entrants knocked out at the same stage share a
//! placement.
//!
//! Swiss entrants past a qualification or elimination threshold are flagged
//! `qualified` or `eliminated`; their ranking is unaffected.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::bracket::formats::Format;
use crate::bracket::models::{MatchSet, MatchStatus, ResultKind, Segment, Side};
use crate::bracket::swiss::SwissResolution;
use crate::config::BracketFormat;
use crate::seeding::EntrantId;

/// One entrant's line in the standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    /// Final or provisional placing; `None` while still alive in an
    /// elimination bracket
    pub placement: Option<u32>,
    pub entrant: EntrantId,
    pub seed: u32,
    pub played: u32,
    pub wins: u32,
    pub losses: u32,
    pub byes: u32,
    /// Match points (Swiss byes count as a win)
    pub points: u32,
    pub games_won: u32,
    pub games_lost: u32,
    /// Sum of opponents' match points
    pub buchholz: u32,
    /// Reached the Swiss qualification threshold
    pub qualified: bool,
    pub eliminated: bool,
}

impl Standing {
    fn new(entrant: EntrantId, seed: u32) -> Self {
        Self {
            placement: None,
            entrant,
            seed,
            played: 0,
            wins: 0,
            losses: 0,
            byes: 0,
            points: 0,
            games_won: 0,
            games_lost: 0,
            buchholz: 0,
            qualified: false,
            eliminated: false,
        }
    }

    pub fn game_differential(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }
}

/// Compute standings, best first
pub fn standings(set: &MatchSet) -> Vec<Standing> {
    let (mut table, opponents) = tally(set);

    match set.kind() {
        BracketFormat::RoundRobin => {
            table.sort_by_key(|s| {
                (
                    Reverse(s.points),
                    Reverse(s.game_differential()),
                    Reverse(s.games_won),
                    s.seed,
                )
            });
            number(&mut table);
        }
        BracketFormat::Swiss => {
            let points: HashMap<EntrantId, u32> = table
                .iter()
                .map(|s| (s.entrant.clone(), s.points))
                .collect();
            for standing in table.iter_mut() {
                standing.buchholz = opponents
                    .get(&standing.entrant)
                    .map(|list| list.iter().filter_map(|o| points.get(o)).sum())
                    .unwrap_or(0);
            }
            if let Format::Swiss(swiss) = set.format() {
                for standing in table.iter_mut() {
                    match swiss.resolution(standing.points, standing.losses) {
                        SwissResolution::Qualified => standing.qualified = true,
                        SwissResolution::Eliminated => standing.eliminated = true,
                        SwissResolution::Active => {}
                    }
                }
            }
            table.sort_by_key(|s| {
                (
                    Reverse(s.points),
                    Reverse(s.buchholz),
                    Reverse(s.game_differential()),
                    s.seed,
                )
            });
            number(&mut table);
        }
        BracketFormat::SingleElimination | BracketFormat::DoubleElimination => {
            rank_elimination(set, &mut table);
        }
    }

    table
}

fn number(table: &mut [Standing]) {
    for (idx, standing) in table.iter_mut().enumerate() {
        standing.placement = Some(idx as u32 + 1);
    }
}

type Opponents = HashMap<EntrantId, Vec<EntrantId>>;

/// Per-entrant totals in seed order, plus who each entrant has played
fn tally(set: &MatchSet) -> (Vec<Standing>, Opponents) {
    let mut table: Vec<Standing> = set
        .seeds()
        .iter()
        .map(|s| Standing::new(s.entrant.id.clone(), s.seed))
        .collect();
    let index: HashMap<EntrantId, usize> = table
        .iter()
        .enumerate()
        .map(|(idx, s)| (s.entrant.clone(), idx))
        .collect();
    let mut opponents = Opponents::new();

    for m in set.matches() {
        let Some(result) = m.result.filter(|_| m.status == MatchStatus::Completed) else {
            continue;
        };

        if result.kind == ResultKind::Bye {
            if let Some(&idx) = m.winner().and_then(|w| index.get(w)) {
                table[idx].byes += 1;
                if m.segment == Segment::Swiss {
                    table[idx].points += 1;
                }
            }
            continue;
        }

        let Some((a, b)) = m.entrants() else {
            continue;
        };
        let (Some(&ia), Some(&ib)) = (index.get(a), index.get(b)) else {
            continue;
        };
        let (winner, loser) = match result.winner {
            Side::A => (ia, ib),
            Side::B => (ib, ia),
        };

        table[winner].wins += 1;
        table[winner].points += 1;
        table[loser].losses += 1;

        for (idx, won, lost) in [(ia, result.score_a, result.score_b), (ib, result.score_b, result.score_a)] {
            table[idx].played += 1;
            table[idx].games_won += won;
            table[idx].games_lost += lost;
        }

        opponents.entry(a.clone()).or_default().push(b.clone());
        opponents.entry(b.clone()).or_default().push(a.clone());
    }

    (table, opponents)
}

/// Order by elimination stage. Later exits rank higher; the champion ranks
/// first and entrants still alive have no placement yet.
fn rank_elimination(set: &MatchSet, table: &mut [Standing]) {
    let lower_rounds = set.rounds(Segment::Lower);
    let reset_played = set.find(Segment::GrandFinal, 2, 1).is_some();
    let mut exits: HashMap<EntrantId, u32> = HashMap::new();

    for m in set.matches() {
        if !m.is_decided() || m.loser_to.is_some() {
            continue;
        }
        if m.segment == Segment::GrandFinal && m.round == 1 && reset_played {
            continue;
        }

        let stage = match m.segment {
            Segment::GrandFinal => lower_rounds + m.round,
            _ => m.round,
        };
        if let Some(loser) = m.loser() {
            exits.insert(loser.clone(), stage);
        }
    }

    let champion = set.champion();
    // 0 champion, 1 alive, 2 eliminated
    let class = |s: &Standing| {
        if champion == Some(&s.entrant) {
            0
        } else if exits.contains_key(&s.entrant) {
            2
        } else {
            1
        }
    };

    for standing in table.iter_mut() {
        standing.eliminated = exits.contains_key(&standing.entrant);
    }
    table.sort_by_key(|s| {
        (
            class(s),
            Reverse(exits.get(&s.entrant).copied().unwrap_or(0)),
            s.seed,
        )
    });

    let mut above = 0u32;
    let mut idx = 0;
    while idx < table.len() {
        let key = (class(&table[idx]), exits.get(&table[idx].entrant).copied());
        let group_end = table[idx..]
            .iter()
            .position(|s| (class(s), exits.get(&s.entrant).copied()) != key)
            .map_or(table.len(), |offset| idx + offset);

        for standing in &mut table[idx..group_end] {
            standing.placement = match key.0 {
                0 => Some(1),
                2 => Some(above + 1),
                _ => None,
            };
        }

        above += (group_end - idx) as u32;
        idx = group_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::builder::build;
    use crate::bracket::formats::{Format, RoundRobin, SingleElimination};
    use crate::config::MatchOptions;
    use crate::progression::apply_result;
    use crate::seeding::{Entrant, SeedAssignment};
    use rand::{SeedableRng, rngs::StdRng};

    fn build_for(n: usize, format: Format) -> MatchSet {
        let seeds = SeedAssignment::from_order(
            (1..=n)
                .map(|i| Entrant::new(format!("S{i}"), 0.0))
                .collect(),
        )
        .unwrap();
        build(&seeds, &format, &MatchOptions::default(), &mut StdRng::seed_from_u64(5)).unwrap()
    }

    /// Lower seed number always wins
    fn play_out(set: &mut MatchSet) {
        loop {
            let Some(m) = set.ready_matches().first().map(|m| (*m).clone()) else {
                break;
            };
            let (a, b) = m.entrants().unwrap();
            let a_better = set.seed_of(a) < set.seed_of(b);
            let (score_a, score_b) = if a_better { (1, 0) } else { (0, 1) };
            apply_result(set, m.id, score_a, score_b).unwrap();
        }
    }

    #[test]
    fn test_round_robin_standings() {
        let mut set = build_for(4, RoundRobin.into());
        play_out(&mut set);

        let table = standings(&set);
        let order: Vec<&str> = table.iter().map(|s| s.entrant.as_str()).collect();
        assert_eq!(order, vec!["S1", "S2", "S3", "S4"]);
        assert_eq!(table[0].wins, 3);
        assert_eq!(table[3].losses, 3);
        assert_eq!(table[0].placement, Some(1));
        assert_eq!(set.champion().map(String::as_str), Some("S1"));
    }

    #[test]
    fn test_elimination_placements() {
        let mut set = build_for(8, SingleElimination.into());
        play_out(&mut set);

        let table = standings(&set);
        let placements: Vec<(String, Option<u32>)> = table
            .iter()
            .map(|s| (s.entrant.clone(), s.placement))
            .collect();

        assert_eq!(placements[0], ("S1".to_string(), Some(1)));
        assert_eq!(placements[1], ("S2".to_string(), Some(2)));
        assert_eq!(placements[2].1, Some(3));
        assert_eq!(placements[3].1, Some(3));
        assert!(placements[4..].iter().all(|(_, p)| *p == Some(5)));
        assert!(table[1..].iter().all(|s| s.eliminated));
    }

    #[test]
    fn test_alive_entrants_have_no_placement() {
        let mut set = build_for(4, SingleElimination.into());
        let first = set.find(Segment::Upper, 1, 1).unwrap().id;
        apply_result(&mut set, first, 1, 0).unwrap();

        let table = standings(&set);
        let alive: Vec<_> = table.iter().filter(|s| s.placement.is_none()).collect();
        assert_eq!(alive.len(), 3);
        let out = table.iter().find(|s| s.entrant == "S4").unwrap();
        assert_eq!(out.placement, Some(4));
        assert!(out.eliminated);
    }
}
