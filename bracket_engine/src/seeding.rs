//! Seeding resolver: turns registered entrants into an ordered seed list.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::SeedingPolicy;
use crate::errors::{BracketError, BracketResult};

/// Opaque entrant identifier supplied by the entrant source
pub type EntrantId = String;

/// A registered entrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    /// Entrant ID
    pub id: EntrantId,
    /// Rating used by the rating and grouped policies
    #[serde(default)]
    pub rating: f64,
    /// Seed requested by an organiser (manual policy)
    #[serde(default)]
    pub manual_seed: Option<u32>,
}

impl Entrant {
    /// Create a new entrant
    pub fn new(id: impl Into<EntrantId>, rating: f64) -> Self {
        Self {
            id: id.into(),
            rating,
            manual_seed: None,
        }
    }

    /// Attach a manual seed
    pub fn with_manual_seed(mut self, seed: u32) -> Self {
        self.manual_seed = Some(seed);
        self
    }
}

/// An entrant paired with its seed (1 = strongest)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seeded {
    pub seed: u32,
    pub entrant: Entrant,
}

/// Seeds 1..N in order, each held by a distinct entrant.
///
/// Deserializing goes through the same validation as [`SeedAssignment::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeedAssignmentRepr", into = "SeedAssignmentRepr")]
pub struct SeedAssignment {
    seeds: Vec<Seeded>,
}

#[derive(Serialize, Deserialize)]
struct SeedAssignmentRepr {
    seeds: Vec<Seeded>,
}

impl TryFrom<SeedAssignmentRepr> for SeedAssignment {
    type Error = BracketError;

    fn try_from(repr: SeedAssignmentRepr) -> Result<Self, Self::Error> {
        SeedAssignment::new(repr.seeds)
    }
}

impl From<SeedAssignment> for SeedAssignmentRepr {
    fn from(assignment: SeedAssignment) -> Self {
        Self {
            seeds: assignment.seeds,
        }
    }
}

impl SeedAssignment {
    /// Validate and order an explicit assignment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSeeding` when seeds are not a contiguous 1..N
    /// permutation or an entrant appears twice.
    pub fn new(mut seeds: Vec<Seeded>) -> BracketResult<Self> {
        seeds.sort_by_key(|s| s.seed);
        let assignment = Self { seeds };
        assignment.validate()?;
        Ok(assignment)
    }

    /// Check that seeds run 1..N in order with no entrant repeated.
    pub fn validate(&self) -> BracketResult<()> {
        for (idx, seeded) in self.seeds.iter().enumerate() {
            let expected = idx as u32 + 1;
            if seeded.seed != expected {
                return Err(BracketError::InvalidSeeding(format!(
                    "expected seed {expected}, found {}",
                    seeded.seed
                )));
            }
        }

        let mut ids = HashSet::new();
        for seeded in &self.seeds {
            if !ids.insert(seeded.entrant.id.as_str()) {
                return Err(BracketError::InvalidSeeding(format!(
                    "duplicate entrant {}",
                    seeded.entrant.id
                )));
            }
        }

        Ok(())
    }

    /// Seed entrants in the order given (first = seed 1)
    pub fn from_order(entrants: Vec<Entrant>) -> BracketResult<Self> {
        let seeds = entrants
            .into_iter()
            .enumerate()
            .map(|(idx, entrant)| Seeded {
                seed: idx as u32 + 1,
                entrant,
            })
            .collect();
        Self::new(seeds)
    }

    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Entrants in seed order
    pub fn as_slice(&self) -> &[Seeded] {
        &self.seeds
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seeded> {
        self.seeds.iter()
    }

    /// Entrant holding a seed
    pub fn entrant(&self, seed: u32) -> Option<&Entrant> {
        seed.checked_sub(1)
            .and_then(|idx| self.seeds.get(idx as usize))
            .map(|s| &s.entrant)
    }

    /// Entrant IDs in seed order
    pub fn ids(&self) -> Vec<EntrantId> {
        self.seeds.iter().map(|s| s.entrant.id.clone()).collect()
    }
}

/// Resolve entrants into a seed assignment.
///
/// `rng` is only consulted by the random policy; passing a seeded generator
/// makes the result reproducible.
///
/// # Errors
///
/// * `InsufficientEntrants` - fewer than two entrants
/// * `InvalidSeeding` - manual seeds missing, repeated or not contiguous,
///   or an entrant ID appears twice
pub fn resolve_seeds<R: Rng + ?Sized>(
    entrants: &[Entrant],
    policy: SeedingPolicy,
    rng: &mut R,
) -> BracketResult<SeedAssignment> {
    if entrants.len() < 2 {
        return Err(BracketError::InsufficientEntrants(entrants.len()));
    }

    match policy {
        SeedingPolicy::Rating => SeedAssignment::from_order(by_rating(entrants)),
        SeedingPolicy::Manual => seed_manually(entrants),
        SeedingPolicy::Random => {
            let mut shuffled = entrants.to_vec();
            shuffled.shuffle(rng);
            SeedAssignment::from_order(shuffled)
        }
        SeedingPolicy::Grouped => {
            let mut grouped = by_rating(entrants);
            shuffle_groups(&mut grouped, rng);
            SeedAssignment::from_order(grouped)
        }
    }
}

/// Rating descending; `sort_by` is stable so equal ratings keep input order.
fn by_rating(entrants: &[Entrant]) -> Vec<Entrant> {
    let mut sorted = entrants.to_vec();
    sorted.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    sorted
}

fn seed_manually(entrants: &[Entrant]) -> BracketResult<SeedAssignment> {
    let seeds = entrants
        .iter()
        .map(|entrant| {
            entrant
                .manual_seed
                .map(|seed| Seeded {
                    seed,
                    entrant: entrant.clone(),
                })
                .ok_or_else(|| {
                    BracketError::InvalidSeeding(format!("entrant {} has no manual seed", entrant.id))
                })
        })
        .collect::<BracketResult<Vec<_>>>()?;

    SeedAssignment::new(seeds)
}

/// Entrants per group for the grouped policy
pub const SEED_GROUP_SIZE: usize = 4;

/// Shuffle inside consecutive groups of four; no entrant leaves its group.
fn shuffle_groups<R: Rng + ?Sized>(order: &mut [Entrant], rng: &mut R) {
    for group in order.chunks_mut(SEED_GROUP_SIZE) {
        group.shuffle(rng);
    }
}

/// Seed numbers in bracket line order for a power-of-two bracket.
///
/// Adjacent pairs are first-round opponents and always sum to `size + 1`;
/// seeds 1 and 2 sit in opposite halves.
pub fn bracket_order(size: usize) -> Vec<u32> {
    let mut order = vec![1u32];
    while order.len() < size {
        let mirror = order.len() as u32 * 2 + 1;
        order = order.iter().flat_map(|&seed| [seed, mirror - seed]).collect();
    }
    order
}
