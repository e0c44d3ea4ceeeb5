//! Integration tests for the tournament manager
//!
//! These tests drive the async lifecycle from bracket generation through
//! result submission to a finished tournament, including concurrent writers.

use bracket_engine::bracket::{MatchStatus, Segment, Side};
use bracket_engine::tournament::{
    MemoryMatchStore, TournamentError, TournamentManager, TournamentState,
};
use bracket_engine::{
    BestOf, BestOfKey, BracketConfig, BracketError, BracketFormat, Entrant, MatchOptions, SeedingPolicy,
};
use std::sync::Arc;

fn entrants(n: usize) -> Vec<Entrant> {
    (1..=n)
        .map(|i| Entrant::new(format!("team-{i}"), 2000.0 - 10.0 * i as f64))
        .collect()
}

fn manager() -> TournamentManager<MemoryMatchStore> {
    TournamentManager::new(Arc::new(MemoryMatchStore::new()))
}

#[tokio::test]
async fn test_full_lifecycle() {
    let mgr = manager();
    let mut config = BracketConfig::new(BracketFormat::DoubleElimination, SeedingPolicy::Rating);
    config.match_options = MatchOptions::new(BestOf::BO3)
        .with_override(BestOfKey::segment(Segment::GrandFinal), BestOf::BO5);

    let bracket = mgr.generate_bracket(1, &entrants(6), &config).await.unwrap();
    assert_eq!(
        bracket.find(Segment::GrandFinal, 1, 1).unwrap().best_of,
        BestOf::BO5
    );

    let mut submitted = 0;
    loop {
        let bracket = mgr.get_bracket(1).await.unwrap();
        let Some(m) = bracket.ready_matches().first().map(|m| (*m).clone()) else {
            break;
        };
        let wins = m.best_of.wins_required();
        mgr.submit_result(1, m.id, wins, 1).await.unwrap();
        submitted += 1;
    }

    let info = mgr.get_tournament_info(1).await.unwrap();
    assert_eq!(info.state, TournamentState::Finished);
    assert_eq!(info.summary.decided, submitted);
    assert!(info.updated_at >= info.created_at);

    let standings = mgr.get_standings(1).await.unwrap();
    assert_eq!(standings.len(), 6);
    assert_eq!(standings[0].placement, Some(1));
    assert_eq!(
        mgr.get_bracket(1).await.unwrap().champion(),
        Some(&standings[0].entrant)
    );
}

#[tokio::test]
async fn test_concurrent_submissions_on_one_match() {
    let mgr = manager();
    let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);
    let bracket = mgr.generate_bracket(5, &entrants(8), &config).await.unwrap();
    let id = bracket.ready_matches()[0].id;

    let mut handles = Vec::new();
    for attempt in 0..8u32 {
        let mgr = mgr.clone();
        handles.push(tokio::spawn(async move {
            let (a, b) = if attempt % 2 == 0 { (1, 0) } else { (0, 1) };
            mgr.submit_result(5, id, a, b).await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(matches!(
                err,
                TournamentError::Bracket(BracketError::MatchNotReady { .. })
            )),
        }
    }

    assert_eq!(accepted, 1);
    let bracket = mgr.get_bracket(5).await.unwrap();
    assert_eq!(bracket.get(id).unwrap().status, MatchStatus::Completed);
    assert_eq!(bracket.summary().decided, 1);
}

#[tokio::test]
async fn test_tournaments_progress_independently() {
    let mgr = manager();
    let config = BracketConfig::new(BracketFormat::RoundRobin, SeedingPolicy::Rating);

    let mut handles = Vec::new();
    for id in 1..=4i64 {
        let mgr = mgr.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            let bracket = mgr.generate_bracket(id, &entrants(4), &config).await?;
            let ids: Vec<_> = bracket.matches().iter().map(|m| m.id).collect();
            for match_id in ids {
                mgr.submit_result(id, match_id, 1, 0).await?;
            }
            Ok::<_, TournamentError>(())
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let listed = mgr.list_tournaments().await.unwrap();
    assert_eq!(listed.len(), 4);
    assert!(listed.iter().all(|info| info.state == TournamentState::Finished));
    assert!(listed.iter().all(|info| info.summary.decided == 6));
}

#[tokio::test]
async fn test_forfeit_through_manager() {
    let mgr = manager();
    let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);
    let bracket = mgr.generate_bracket(9, &entrants(2), &config).await.unwrap();
    let id = bracket.ready_matches()[0].id;

    let outcome = mgr.submit_forfeit(9, id, Side::B).await.unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.champion.as_deref(), Some("team-2"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_and_regenerate_race_with_submissions() {
    let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);

    for _ in 0..50 {
        let mgr = manager();
        let bracket = mgr.generate_bracket(1, &entrants(4), &config).await.unwrap();
        let match_id = bracket.ready_matches()[0].id;

        let submit = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.submit_result(1, match_id, 1, 0).await.map(|_| ()) })
        };
        let delete = {
            let mgr = mgr.clone();
            tokio::spawn(async move { mgr.delete_bracket(1).await })
        };
        let generate = {
            let mgr = mgr.clone();
            let config = config.clone();
            tokio::spawn(async move {
                mgr.generate_bracket(1, &entrants(6), &config).await.map(|_| ())
            })
        };
        let regenerate = {
            let mgr = mgr.clone();
            let config = config.clone();
            tokio::spawn(async move {
                mgr.regenerate_bracket(1, &entrants(6), &config).await.map(|_| ())
            })
        };

        for handle in [submit, delete, generate, regenerate] {
            // individual calls may lose the race; only the final state matters
            let _ = handle.await.unwrap();
        }

        // every write after the six-entrant rebuild sees that bracket, so the
        // original four-entrant one can never come back
        if let Ok(bracket) = mgr.get_bracket(1).await {
            assert_eq!(bracket.entrant_count(), 6);
        }
    }
}

#[tokio::test]
async fn test_regenerate_and_delete() {
    let mgr = manager();
    let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);
    mgr.generate_bracket(3, &entrants(4), &config).await.unwrap();

    let swiss = BracketConfig::new(BracketFormat::Swiss, SeedingPolicy::Rating);
    let replaced = mgr.regenerate_bracket(3, &entrants(6), &swiss).await.unwrap();
    assert_eq!(replaced.entrant_count(), 6);
    assert_eq!(
        mgr.get_tournament_info(3).await.unwrap().config.format,
        BracketFormat::Swiss
    );

    mgr.delete_bracket(3).await.unwrap();
    assert!(matches!(
        mgr.get_standings(3).await,
        Err(TournamentError::NotFound(3))
    ));
    assert!(mgr.list_tournaments().await.unwrap().is_empty());

    // the ID is free again
    mgr.generate_bracket(3, &entrants(4), &config).await.unwrap();
}
