//! Bracket builder and match graph.
//!
//! This module provides:
//! - The match graph (`MatchSet`) with slots, links and results
//! - Format strategies for single/double elimination, round robin and Swiss
//! - Construction of the initial graph from a seed assignment
//!
//! ## Example
//!
//! ```
//! use bracket_engine::bracket::{generate, Segment};
//! use bracket_engine::config::{BracketConfig, BracketFormat, SeedingPolicy};
//! use bracket_engine::seeding::Entrant;
//!
//! let entrants: Vec<Entrant> = (1..=6)
//!     .map(|i| Entrant::new(format!("team-{i}"), 1000.0 + i as f64))
//!     .collect();
//! let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);
//!
//! let bracket = generate(&entrants, &config).unwrap();
//! assert_eq!(bracket.rounds(Segment::Upper), 3);
//! assert_eq!(bracket.round(Segment::Upper, 1).len(), 4);
//! ```

pub mod builder;
pub mod elimination;
pub mod formats;
pub mod models;
pub mod round_robin;
pub mod swiss;

pub use builder::{build, generate};
pub use formats::{
    DoubleElimination, Format, FormatStrategy, RoundRobin, SingleElimination, Swiss,
};
pub use models::{
    BracketStatus, BracketSummary, Feed, Link, Match, MatchId, MatchResult, MatchSet,
    MatchStatus, Outcome, ResultKind, Segment, Side, Slot, SwissProgress,
};
pub use swiss::SwissResolution;
