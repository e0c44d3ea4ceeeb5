//! Format calculator: round, match and bye counts for a field size.
//!
//! Pure arithmetic; nothing here touches a match set.

use serde::{Deserialize, Serialize};

use crate::config::BracketFormat;
use crate::errors::{BracketError, BracketResult};

/// Shape of a bracket for a given number of entrants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub format: BracketFormat,
    pub entrants: usize,
    /// Rounds in the main segment (upper bracket for elimination formats)
    pub rounds: u32,
    /// Lower-bracket rounds (double elimination only)
    pub lower_rounds: u32,
    /// Matches decided by play when no reset is needed
    pub matches: u32,
    /// Matches decided by play in the longest case (with a bracket reset)
    pub max_matches: u32,
    /// Elimination: round-one byes. Round robin and Swiss: sit-outs over the event
    pub byes: u32,
    /// Power-of-two bracket size (elimination only, otherwise the field size)
    pub bracket_size: u32,
    /// Matches played per round (round robin and Swiss)
    pub matches_per_round: u32,
}

/// Smallest power of two at least `n`
pub fn bracket_size(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// ceil(log2 n)
pub fn rounds_for(n: usize) -> u32 {
    bracket_size(n).trailing_zeros()
}

fn check_field(format: BracketFormat, n: usize) -> BracketResult<()> {
    if n < 2 {
        return Err(BracketError::InvalidEntrantCount {
            format: format.to_string(),
            count: n,
        });
    }
    Ok(())
}

/// Single elimination: N-1 matches, P-N first-round byes
pub fn single_elimination(n: usize) -> BracketResult<FormatSummary> {
    check_field(BracketFormat::SingleElimination, n)?;

    let size = bracket_size(n) as u32;
    let matches = n as u32 - 1;

    Ok(FormatSummary {
        format: BracketFormat::SingleElimination,
        entrants: n,
        rounds: rounds_for(n),
        lower_rounds: 0,
        matches,
        max_matches: matches,
        byes: size - n as u32,
        bracket_size: size,
        matches_per_round: 0,
    })
}

/// Double elimination: every entrant but the champion loses twice, except the
/// grand-final loser when no reset is played.
pub fn double_elimination(n: usize) -> BracketResult<FormatSummary> {
    check_field(BracketFormat::DoubleElimination, n)?;

    let size = bracket_size(n) as u32;
    let rounds = rounds_for(n);
    let matches = 2 * n as u32 - 2;

    Ok(FormatSummary {
        format: BracketFormat::DoubleElimination,
        entrants: n,
        rounds,
        lower_rounds: 2 * rounds - 2,
        matches,
        max_matches: matches + 1,
        byes: size - n as u32,
        bracket_size: size,
        matches_per_round: 0,
    })
}

/// Round robin: every pair meets once
pub fn round_robin(n: usize) -> BracketResult<FormatSummary> {
    check_field(BracketFormat::RoundRobin, n)?;

    let n32 = n as u32;
    let odd = n % 2 == 1;
    let matches = n32 * (n32 - 1) / 2;

    Ok(FormatSummary {
        format: BracketFormat::RoundRobin,
        entrants: n,
        rounds: if odd { n32 } else { n32 - 1 },
        lower_rounds: 0,
        matches,
        max_matches: matches,
        byes: if odd { n32 } else { 0 },
        bracket_size: n32,
        matches_per_round: n32 / 2,
    })
}

/// Swiss with the default ceil(log2 N) rounds
pub fn swiss(n: usize) -> BracketResult<FormatSummary> {
    swiss_with_rounds(n, None)
}

/// Swiss with an explicit round count.
///
/// # Errors
///
/// Returns `InvalidConfiguration` when the round count is zero or above
/// [`swiss_round_limit`].
pub fn swiss_with_rounds(n: usize, rounds: Option<u32>) -> BracketResult<FormatSummary> {
    check_field(BracketFormat::Swiss, n)?;

    let n32 = n as u32;
    let limit = swiss_round_limit(n);
    let rounds = rounds.unwrap_or_else(|| rounds_for(n));
    if rounds == 0 || rounds > limit {
        return Err(BracketError::InvalidConfiguration(format!(
            "swiss with {n} entrants supports 1..={limit} rounds, got {rounds}"
        )));
    }

    let per_round = n32 / 2;

    Ok(FormatSummary {
        format: BracketFormat::Swiss,
        entrants: n,
        rounds,
        lower_rounds: 0,
        matches: rounds * per_round,
        max_matches: rounds * per_round,
        byes: rounds * (n32 % 2),
        bracket_size: n32,
        matches_per_round: per_round,
    })
}

/// Most Swiss rounds a field can be scheduled for.
///
/// Up to this many rounds a rematch-free pairing exists whatever the earlier
/// results: the unplayed-pairs graph (plus a bye vertex for an odd field)
/// keeps minimum degree at least half its size, so it has a perfect matching
/// by Dirac's theorem.
pub fn swiss_round_limit(n: usize) -> u32 {
    (n as u32).div_ceil(2)
}

/// Summary for any format
pub fn summarize(format: BracketFormat, n: usize) -> BracketResult<FormatSummary> {
    match format {
        BracketFormat::SingleElimination => single_elimination(n),
        BracketFormat::DoubleElimination => double_elimination(n),
        BracketFormat::RoundRobin => round_robin(n),
        BracketFormat::Swiss => swiss(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_size() {
        assert_eq!(bracket_size(2), 2);
        assert_eq!(bracket_size(5), 8);
        assert_eq!(bracket_size(8), 8);
        assert_eq!(bracket_size(9), 16);
        assert_eq!(rounds_for(2), 1);
        assert_eq!(rounds_for(5), 3);
        assert_eq!(rounds_for(16), 4);
        assert_eq!(rounds_for(17), 5);
    }

    #[test]
    fn test_single_elimination() {
        let summary = single_elimination(5).unwrap();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.matches, 4);
        assert_eq!(summary.byes, 3);
        assert_eq!(summary.bracket_size, 8);

        let summary = single_elimination(8).unwrap();
        assert_eq!(summary.matches, 7);
        assert_eq!(summary.byes, 0);
    }

    #[test]
    fn test_double_elimination() {
        let summary = double_elimination(8).unwrap();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.lower_rounds, 4);
        assert_eq!(summary.matches, 14);
        assert_eq!(summary.max_matches, 15);

        let summary = double_elimination(2).unwrap();
        assert_eq!(summary.lower_rounds, 0);
        assert_eq!(summary.matches, 2);
    }

    #[test]
    fn test_round_robin() {
        let even = round_robin(6).unwrap();
        assert_eq!(even.rounds, 5);
        assert_eq!(even.matches, 15);
        assert_eq!(even.byes, 0);

        let odd = round_robin(5).unwrap();
        assert_eq!(odd.rounds, 5);
        assert_eq!(odd.matches, 10);
        assert_eq!(odd.byes, 5);
        assert_eq!(odd.matches_per_round, 2);
    }

    #[test]
    fn test_swiss() {
        let summary = swiss(16).unwrap();
        assert_eq!(summary.rounds, 4);
        assert_eq!(summary.matches_per_round, 8);
        assert_eq!(summary.matches, 32);

        let summary = swiss(7).unwrap();
        assert_eq!(summary.rounds, 3);
        assert_eq!(summary.byes, 3);

        assert!(swiss_with_rounds(4, Some(2)).is_ok());
        assert!(swiss_with_rounds(4, Some(3)).is_err());
        assert!(swiss_with_rounds(5, Some(3)).is_ok());
        assert!(swiss_with_rounds(5, Some(4)).is_err());
        assert!(swiss_with_rounds(5, Some(0)).is_err());
    }

    #[test]
    fn test_swiss_round_limit() {
        assert_eq!(swiss_round_limit(2), 1);
        assert_eq!(swiss_round_limit(3), 2);
        assert_eq!(swiss_round_limit(8), 4);
        assert_eq!(swiss_round_limit(9), 5);

        // the default round count always fits
        for n in 2..=256 {
            assert!(rounds_for(n) <= swiss_round_limit(n), "{n} entrants");
        }
    }

    #[test]
    fn test_too_few_entrants() {
        for format in [
            BracketFormat::SingleElimination,
            BracketFormat::DoubleElimination,
            BracketFormat::RoundRobin,
            BracketFormat::Swiss,
        ] {
            assert!(matches!(
                summarize(format, 1),
                Err(BracketError::InvalidEntrantCount { count: 1, .. })
            ));
        }
    }
}
