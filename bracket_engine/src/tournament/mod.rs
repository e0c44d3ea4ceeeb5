//! Tournament module: async lifecycle around the bracket engine.
//!
//! This module provides:
//! - Bracket generation and regeneration per tournament
//! - Result and forfeit submission, serialized per tournament
//! - Pluggable storage through the [`MatchStore`] trait
//!
//! ## Example
//!
//! ```no_run
//! use bracket_engine::config::{BracketConfig, BracketFormat, SeedingPolicy};
//! use bracket_engine::seeding::Entrant;
//! use bracket_engine::tournament::{MemoryMatchStore, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::new(Arc::new(MemoryMatchStore::new()));
//!
//!     let entrants = vec![
//!         Entrant::new("alpha", 1800.0),
//!         Entrant::new("bravo", 1650.0),
//!         Entrant::new("charlie", 1500.0),
//!     ];
//!     let config = BracketConfig::new(BracketFormat::DoubleElimination, SeedingPolicy::Rating);
//!
//!     let bracket = manager.generate_bracket(1, &entrants, &config).await?;
//!     let first = bracket.ready_matches()[0].id;
//!     let outcome = manager.submit_result(1, first, 1, 0).await?;
//!     println!("{} advances", outcome.winner);
//!
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;
pub mod store;

pub use manager::{TournamentError, TournamentManager, TournamentResult};
pub use models::{TournamentId, TournamentInfo, TournamentRecord, TournamentState};
pub use store::{MatchStore, MemoryMatchStore};
