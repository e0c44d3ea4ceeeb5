//! # Bracket Engine
//!
//! Tournament bracket generation and progression for single elimination,
//! double elimination, round robin and Swiss events.
//!
//! A bracket is a graph of matches held in an arena ([`MatchSet`]). Each match
//! has two slots that are either a concrete entrant, a bye, or a placeholder
//! naming the match whose winner or loser will fill it. Recording a result
//! moves entrants along those links, completes walkovers against byes,
//! creates follow-up matches (bracket reset, next Swiss round) and decides the
//! champion.
//!
//! ## Core Modules
//!
//! - [`seeding`]: Entrant ordering policies and bracket placement order
//! - [`calculator`]: Round, match and bye counts per format
//! - [`bracket`]: Match graph and format strategies
//! - [`progression`]: Result recording and propagation
//! - [`pairing`]: Swiss pairing with rematch avoidance
//! - [`standings`]: Rankings and placements
//! - [`tournament`]: Async manager over a pluggable store
//!
//! ## Example
//!
//! ```
//! use bracket_engine::{BracketConfig, BracketFormat, Entrant, SeedingPolicy};
//! use bracket_engine::{apply_result, generate};
//!
//! let entrants = vec![
//!     Entrant::new("A", 1900.0),
//!     Entrant::new("B", 1800.0),
//!     Entrant::new("C", 1700.0),
//!     Entrant::new("D", 1600.0),
//! ];
//! let config = BracketConfig::new(BracketFormat::SingleElimination, SeedingPolicy::Rating);
//! let mut bracket = generate(&entrants, &config).unwrap();
//!
//! loop {
//!     let Some(id) = bracket.ready_matches().first().map(|m| m.id) else {
//!         break;
//!     };
//!     apply_result(&mut bracket, id, 1, 0).unwrap();
//! }
//! assert_eq!(bracket.champion().map(String::as_str), Some("A"));
//! ```

/// Bracket configuration and best-of rules.
pub mod config;
pub use config::{
    BestOf, BestOfKey, BracketConfig, BracketFormat, MatchOptions, SeedingPolicy, SwissPairing,
};

/// Error types.
pub mod errors;
pub use errors::{BracketError, BracketResult};

/// Seeding resolver.
pub mod seeding;
pub use seeding::{Entrant, EntrantId, SeedAssignment, Seeded, resolve_seeds};

/// Format calculator.
pub mod calculator;
pub use calculator::FormatSummary;

/// Match graph and builder.
pub mod bracket;
pub use bracket::{
    Format, FormatStrategy, Match, MatchId, MatchSet, MatchStatus, Segment, Side, Slot, build,
    generate,
};

/// Progression engine.
pub mod progression;
pub use progression::{ProgressionOutcome, apply_forfeit, apply_result};

/// Swiss pairing generator.
pub mod pairing;
pub use pairing::{PairHistory, Pairing, SwissStanding, generate_round};

/// Standings and placements.
pub mod standings;
pub use standings::{Standing, standings};

/// Tournament lifecycle over async storage.
pub mod tournament;
