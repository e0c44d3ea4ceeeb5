//! Tournament bracket tool.
//!
//! Reads entrants from a JSON file, generates a bracket and prints it. With
//! `--simulate` every match is played through the tournament manager, the
//! higher-rated entrant winning, and the final standings are printed.

mod config;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Error};
use bracket_engine::{
    FormatStrategy, MatchSet, Segment, Slot, Standing,
    bracket::Outcome,
    seeding::Entrant,
    tournament::{MemoryMatchStore, TournamentManager},
};
use config::{CliConfig, ConfigError, Overrides};
use log::{info, warn};
use pico_args::Arguments;
use serde::Serialize;

const HELP: &str = "\
Generate and simulate tournament brackets

USAGE:
  bracket_cli [OPTIONS] <ENTRANTS.json>

OPTIONS:
  --format       FORMAT   single_elimination, double_elimination, round_robin, swiss  [default: env BRACKET_FORMAT or single_elimination]
  --seeding      POLICY   rating, manual, random, grouped                             [default: env BRACKET_SEEDING or rating]
  --best-of      RULES    Default and overrides, e.g. bo3,grand_final=bo5              [default: env BRACKET_BEST_OF or bo1]
  --rng-seed     N        Seed for random seeding and pairing                          [default: env BRACKET_RNG_SEED]
  --swiss-rounds N        Swiss rounds to play                                         [default: env BRACKET_SWISS_ROUNDS or ceil(log2 N)]
  --first-round  METHOD   Swiss round-one pairing: adjacent, folding, random           [default: env BRACKET_SWISS_FIRST_ROUND or adjacent]
  --qualify-wins N        Swiss points that qualify an entrant early                   [default: env BRACKET_SWISS_QUALIFY_WINS or off]
  --eliminate-losses N    Swiss losses that eliminate an entrant early                 [default: env BRACKET_SWISS_ELIMINATE_LOSSES or off]

FLAGS:
  --no-reset              Decide double elimination in a single grand final
  --summary               Only print round, match and bye counts
  --simulate              Play every match, higher rating wins
  --json                  Print JSON instead of text
  -h, --help              Print help information

ENVIRONMENT:
  BRACKET_RESET           true or false (see --no-reset)
  RUST_LOG                Log level (e.g., info, debug)
  (A .env file in the working directory is read if present)
";

struct Args {
    entrants: PathBuf,
    overrides: Overrides,
    summary_only: bool,
    simulate: bool,
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    bracket: &'a MatchSet,
    standings: Vec<Standing>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let no_reset = pargs.contains("--no-reset");
    let summary_only = pargs.contains("--summary");
    let simulate_flag = pargs.contains("--simulate");
    let json = pargs.contains("--json");

    let overrides = Overrides {
        format: pargs.opt_value_from_str("--format")?,
        seeding: pargs.opt_value_from_str("--seeding")?,
        best_of: pargs.opt_value_from_str("--best-of")?,
        rng_seed: pargs.opt_value_from_str("--rng-seed")?,
        swiss_rounds: pargs.opt_value_from_str("--swiss-rounds")?,
        swiss_first_round: pargs.opt_value_from_str("--first-round")?,
        qualify_wins: pargs.opt_value_from_str("--qualify-wins")?,
        eliminate_losses: pargs.opt_value_from_str("--eliminate-losses")?,
        bracket_reset: no_reset.then_some(false),
    };

    let entrants = pargs
        .opt_free_from_str()?
        .ok_or_else(|| ConfigError::MissingRequired {
            var: "ENTRANTS.json".to_string(),
            hint: "Pass a JSON array of {\"id\", \"rating\"} objects".to_string(),
        })?;

    let args = Args {
        entrants,
        overrides,
        summary_only,
        simulate: simulate_flag,
        json,
    };

    env_logger::builder().format_target(false).init();

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        warn!("Ignoring unused arguments: {:?}", remaining);
    }

    let config = CliConfig::from_env(args.overrides)?;
    config.validate()?;

    let raw = std::fs::read_to_string(&args.entrants)
        .with_context(|| format!("Failed to read {}", args.entrants.display()))?;
    let entrants: Vec<Entrant> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse entrants from {}", args.entrants.display()))?;
    info!("Loaded {} entrants from {}", entrants.len(), args.entrants.display());

    if args.summary_only {
        let summary = config.bracket.strategy().summary(entrants.len())?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("format:        {}", summary.format);
            println!("entrants:      {}", summary.entrants);
            println!("rounds:        {}", summary.rounds);
            if summary.lower_rounds > 0 {
                println!("lower rounds:  {}", summary.lower_rounds);
            }
            println!("matches:       {}", summary.matches);
            if summary.max_matches != summary.matches {
                println!("with reset:    {}", summary.max_matches);
            }
            println!("byes:          {}", summary.byes);
        }
        return Ok(());
    }

    let manager = TournamentManager::new(Arc::new(MemoryMatchStore::new()));
    let tournament = 1;
    let mut bracket = manager
        .generate_bracket(tournament, &entrants, &config.bracket)
        .await?;

    if args.simulate {
        let ratings: HashMap<&str, f64> = entrants
            .iter()
            .map(|e| (e.id.as_str(), e.rating))
            .collect();
        let played = simulate(&manager, tournament, &ratings).await?;
        info!("Simulated {} matches", played);
        bracket = manager.get_bracket(tournament).await?;
    }

    let standings = manager.get_standings(tournament).await?;

    if args.json {
        let report = Report {
            bracket: &bracket,
            standings,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_bracket(&bracket);
        println!();
        print_standings(&standings);
    }

    Ok(())
}

/// Play every ready match until the bracket is finished
async fn simulate(
    manager: &TournamentManager<MemoryMatchStore>,
    tournament: i64,
    ratings: &HashMap<&str, f64>,
) -> Result<usize, Error> {
    let mut played = 0;
    loop {
        let bracket = manager.get_bracket(tournament).await?;
        let Some(m) = bracket.ready_matches().first().map(|m| (*m).clone()) else {
            break;
        };
        let Some((a, b)) = m.entrants() else {
            break;
        };

        let rating = |id: &str| ratings.get(id).copied().unwrap_or_default();
        let wins = m.best_of.wins_required();
        let (score_a, score_b) = if rating(a.as_str()) >= rating(b.as_str()) {
            (wins, 0)
        } else {
            (0, wins)
        };

        manager
            .submit_result(tournament, m.id, score_a, score_b)
            .await?;
        played += 1;
    }
    Ok(played)
}

fn describe(slot: &Slot) -> String {
    match slot {
        Slot::Entrant(id) => id.clone(),
        Slot::Bye => "BYE".to_string(),
        Slot::Pending(feed) => match feed.outcome {
            Outcome::Winner => format!("winner of #{}", feed.source),
            Outcome::Loser => format!("loser of #{}", feed.source),
        },
    }
}

fn print_bracket(bracket: &MatchSet) {
    println!("{} bracket, {} entrants", bracket.kind(), bracket.entrant_count());

    for segment in [
        Segment::Upper,
        Segment::Lower,
        Segment::GrandFinal,
        Segment::RoundRobin,
        Segment::Swiss,
    ] {
        for round in 1..=bracket.rounds(segment) {
            println!();
            println!("{} round {}", segment, round);
            for m in bracket.round(segment, round) {
                let result = match m.result {
                    Some(result) => format!("{}-{} ({:?})", result.score_a, result.score_b, result.kind),
                    None => m.status.to_string(),
                };
                println!(
                    "  #{:<4} {:>20} vs {:<20} bo{} {}",
                    m.id,
                    describe(&m.slot_a),
                    describe(&m.slot_b),
                    m.best_of.games(),
                    result
                );
            }
        }
    }

    if let Some(champion) = bracket.champion() {
        println!();
        println!("Champion: {}", champion);
    }
}

fn print_standings(standings: &[Standing]) {
    println!("{:>5}  {:<20} {:>4} {:>4} {:>4} {:>6}  status", "place", "entrant", "W", "L", "pts", "games");
    for s in standings {
        let place = s
            .placement
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let status = if s.qualified {
            "qualified"
        } else if s.eliminated {
            "out"
        } else {
            ""
        };
        println!(
            "{:>5}  {:<20} {:>4} {:>4} {:>4} {:>3}-{:<3}  {}",
            place, s.entrant, s.wins, s.losses, s.points, s.games_won, s.games_lost, status
        );
    }
}
