//! Bracket builder: seeds plus a format in, a ready-to-play match set out.

use log::info;
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::config::{BracketConfig, MatchOptions};
use crate::errors::BracketResult;
use crate::progression;
use crate::seeding::{Entrant, SeedAssignment, resolve_seeds};

use super::formats::{Format, FormatStrategy};
use super::models::MatchSet;

/// Build the full initial match graph for a seeded field.
///
/// Byes are resolved before returning: a match against a bye is completed
/// as a walkover and its entrant already sits in the next round.
///
/// # Errors
///
/// * `InvalidSeeding` - seeds are not a contiguous 1..N run of distinct entrants
/// * `InvalidEntrantCount` - the format cannot run with this many entrants
/// * `InvalidConfiguration` - e.g. more Swiss rounds than the field allows
pub fn build(
    seeds: &SeedAssignment,
    format: &Format,
    options: &MatchOptions,
    rng: &mut dyn RngCore,
) -> BracketResult<MatchSet> {
    seeds.validate()?;
    let summary = format.summary(seeds.len())?;

    let mut set = MatchSet::new(format.clone(), options.clone(), seeds);
    format.populate(&mut set, rng)?;
    let progress = progression::settle_new(&mut set)?;

    info!(
        "Built {} bracket: {} entrants, {} rounds, {} matches ({} walkovers)",
        summary.format,
        seeds.len(),
        summary.rounds,
        set.matches().len(),
        progress.walkovers()
    );

    Ok(set)
}

/// Seed entrants and build their bracket from a configuration.
///
/// Uses `config.random_seed` for reproducible random seeding and Swiss
/// pairing, or OS entropy when it is unset.
pub fn generate(entrants: &[Entrant], config: &BracketConfig) -> BracketResult<MatchSet> {
    config.validate()?;

    let mut rng = match config.random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let seeds = resolve_seeds(entrants, config.seeding, &mut rng)?;
    build(&seeds, &config.strategy(), &config.match_options, &mut rng)
}
