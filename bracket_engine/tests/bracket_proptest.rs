/// Property-based tests for bracket progression using proptest
///
/// Every format is played to completion with arbitrary results and the
/// finished bracket is checked for the structural guarantees of its format.
use bracket_engine::bracket::MatchSet;
use bracket_engine::{
    BracketConfig, BracketFormat, Entrant, SeedingPolicy, apply_result, generate, standings,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn field(n: usize) -> Vec<Entrant> {
    (1..=n)
        .map(|i| Entrant::new(format!("E{i}"), (100 - i) as f64))
        .collect()
}

// Strategy for a stream of coin flips deciding who wins each match
fn results_strategy() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..64)
}

/// Play every ready match, taking winners from `flips` in turn
fn play_out(set: &mut MatchSet, flips: &[bool]) -> usize {
    let mut played = 0;
    loop {
        let Some((id, wins)) = set
            .ready_matches()
            .first()
            .map(|m| (m.id, m.best_of.wins_required()))
        else {
            break;
        };
        let (a, b) = if flips[played % flips.len()] { (wins, 0) } else { (0, wins) };
        apply_result(set, id, a, b).expect("ready match accepts a decisive score");
        played += 1;
    }
    played
}

fn losses(set: &MatchSet) -> HashMap<String, u32> {
    let mut losses = HashMap::new();
    for m in set.matches().iter().filter(|m| m.is_decided()) {
        *losses.entry(m.loser().unwrap().clone()).or_default() += 1;
    }
    losses
}

fn byes(set: &MatchSet) -> HashMap<String, u32> {
    let mut byes = HashMap::new();
    for m in set.matches().iter().filter(|m| m.is_walkover()) {
        *byes.entry(m.winner().unwrap().clone()).or_default() += 1;
    }
    byes
}

fn assert_no_rematch(set: &MatchSet) -> Result<(), TestCaseError> {
    let mut pairs = HashSet::new();
    for m in set.matches().iter().filter(|m| m.is_decided()) {
        let (a, b) = m.entrants().unwrap();
        let key = if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
        prop_assert!(pairs.insert(key));
    }
    Ok(())
}

fn generate_for(format: BracketFormat, n: usize) -> MatchSet {
    let config = BracketConfig::new(format, SeedingPolicy::Rating);
    generate(&field(n), &config).expect("field of two or more builds")
}

proptest! {
    #[test]
    fn test_single_elimination_completes(n in 2usize..40, flips in results_strategy()) {
        let mut set = generate_for(BracketFormat::SingleElimination, n);
        let played = play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        prop_assert_eq!(played, n - 1);

        let champion = set.champion().cloned().unwrap();
        let losses = losses(&set);
        prop_assert_eq!(losses.len(), n - 1);
        prop_assert!(losses.values().all(|&count| count == 1));
        prop_assert!(!losses.contains_key(&champion));
    }

    #[test]
    fn test_double_elimination_completes(n in 2usize..40, flips in results_strategy()) {
        let mut set = generate_for(BracketFormat::DoubleElimination, n);
        let played = play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        prop_assert!(played == 2 * n - 2 || played == 2 * n - 1, "played {} for {}", played, n);

        let champion = set.champion().cloned().unwrap();
        let losses = losses(&set);
        prop_assert!(losses.get(&champion).copied().unwrap_or(0) <= 1);
        for (entrant, count) in &losses {
            if *entrant != champion {
                prop_assert_eq!(*count, 2, "{} lost {} times", entrant, count);
            }
        }
        prop_assert_eq!(losses.len() + usize::from(!losses.contains_key(&champion)), n);
    }

    #[test]
    fn test_round_robin_meets_everyone_once(n in 2usize..14, flips in results_strategy()) {
        let mut set = generate_for(BracketFormat::RoundRobin, n);
        let played = play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        prop_assert_eq!(played, n * (n - 1) / 2);

        let mut pairs = HashSet::new();
        for m in set.matches().iter().filter(|m| m.is_decided()) {
            let (a, b) = m.entrants().unwrap();
            let key = if a < b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) };
            prop_assert!(pairs.insert(key));
        }

        let table = standings(&set);
        prop_assert_eq!(set.champion(), Some(&table[0].entrant));
        prop_assert_eq!(table.iter().map(|s| s.wins).sum::<u32>() as usize, played);
    }

    #[test]
    fn test_swiss_never_repeats_a_pairing(n in 2usize..33, flips in results_strategy()) {
        let mut set = generate_for(BracketFormat::Swiss, n);
        let rounds = set.swiss_progress().unwrap().total_rounds;
        let played = play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        prop_assert_eq!(played, rounds as usize * (n / 2));
        assert_no_rematch(&set)?;

        // fewer rounds than entrants: nobody sits out twice
        let byes = byes(&set);
        prop_assert!(byes.values().all(|&count| count == 1));
        let expected = if n % 2 == 1 { rounds as usize } else { 0 };
        prop_assert_eq!(byes.len(), expected);
    }

    #[test]
    fn test_swiss_pairs_every_round_at_round_limit(n in 2usize..21, flips in results_strategy()) {
        let rounds = n.div_ceil(2) as u32;
        let mut config = BracketConfig::new(BracketFormat::Swiss, SeedingPolicy::Rating);
        config.swiss_rounds = Some(rounds);
        let mut set = generate(&field(n), &config).expect("round limit is accepted");

        let played = play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        prop_assert_eq!(set.swiss_progress().unwrap().current_round, rounds);
        prop_assert_eq!(played, rounds as usize * (n / 2));
        assert_no_rematch(&set)?;
        prop_assert!(byes(&set).values().all(|&count| count == 1));
    }

    #[test]
    fn test_swiss_thresholds_stop_pairing(n in 2usize..33, flips in results_strategy()) {
        let mut config = BracketConfig::new(BracketFormat::Swiss, SeedingPolicy::Rating);
        config.swiss_qualify_wins = Some(2);
        config.swiss_eliminate_losses = Some(2);
        let mut set = generate(&field(n), &config).expect("field of two or more builds");

        play_out(&mut set, &flips);

        prop_assert!(set.is_completed());
        assert_no_rematch(&set)?;
        for line in standings(&set) {
            prop_assert!(line.points <= 2, "{} has {} points", line.entrant, line.points);
            prop_assert!(line.losses <= 2, "{} has {} losses", line.entrant, line.losses);
        }
    }

    #[test]
    fn test_elimination_placements_are_consistent(n in 2usize..24, flips in results_strategy()) {
        let mut set = generate_for(BracketFormat::DoubleElimination, n);
        play_out(&mut set, &flips);

        let table = standings(&set);
        prop_assert_eq!(table.len(), n);
        prop_assert_eq!(table[0].placement, Some(1));
        prop_assert_eq!(set.champion(), Some(&table[0].entrant));
        prop_assert!(table.iter().all(|s| s.placement.is_some()));
        prop_assert!(table.windows(2).all(|w| w[0].placement <= w[1].placement));
    }
}
