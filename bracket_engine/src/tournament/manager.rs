//! Tournament manager: bracket lifecycle on top of a match store.

use chrono::Utc;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use super::models::{TournamentId, TournamentInfo, TournamentRecord};
use super::store::MatchStore;
use crate::bracket::{self, MatchId, MatchSet, Side};
use crate::config::BracketConfig;
use crate::errors::BracketError;
use crate::progression::{self, ProgressionOutcome};
use crate::seeding::Entrant;
use crate::standings::{self, Standing};

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Bracket already generated for tournament {0}")]
    AlreadyGenerated(TournamentId),

    #[error("Bracket error: {0}")]
    Bracket(#[from] BracketError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
///
/// Serializes writes per tournament: results for one bracket are applied one
/// at a time while different tournaments proceed independently.
pub struct TournamentManager<S: MatchStore> {
    store: Arc<S>,
    locks: Arc<RwLock<HashMap<TournamentId, Arc<Mutex<()>>>>>,
}

impl<S: MatchStore> Clone for TournamentManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<S: MatchStore> TournamentManager<S> {
    /// Create a new tournament manager
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Write lock for one tournament
    async fn lock_for(&self, id: TournamentId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&id) {
            return Arc::clone(lock);
        }

        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(id).or_default())
    }

    async fn load(&self, id: TournamentId) -> TournamentResult<TournamentRecord> {
        self.store
            .load(id)
            .await?
            .ok_or(TournamentError::NotFound(id))
    }

    /// Seed entrants and build a bracket for a tournament.
    ///
    /// # Arguments
    ///
    /// * `id` - Tournament ID
    /// * `entrants` - Registered entrants
    /// * `config` - Format, seeding and best-of rules
    ///
    /// # Returns
    ///
    /// The generated match set
    ///
    /// # Errors
    ///
    /// Returns `AlreadyGenerated` if the tournament has a bracket; use
    /// [`TournamentManager::regenerate_bracket`] to replace it.
    pub async fn generate_bracket(
        &self,
        id: TournamentId,
        entrants: &[Entrant],
        config: &BracketConfig,
    ) -> TournamentResult<MatchSet> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        if self.store.load(id).await?.is_some() {
            return Err(TournamentError::AlreadyGenerated(id));
        }

        self.build_and_store(id, entrants, config).await
    }

    /// Throw away any existing bracket and build a new one.
    ///
    /// The new bracket is built before anything is replaced, so a failed build
    /// leaves the old bracket in place.
    pub async fn regenerate_bracket(
        &self,
        id: TournamentId,
        entrants: &[Entrant],
        config: &BracketConfig,
    ) -> TournamentResult<MatchSet> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        self.build_and_store(id, entrants, config).await
    }

    async fn build_and_store(
        &self,
        id: TournamentId,
        entrants: &[Entrant],
        config: &BracketConfig,
    ) -> TournamentResult<MatchSet> {
        let bracket = bracket::generate(entrants, config)?;
        let record = TournamentRecord::new(id, config.clone(), bracket);
        self.store.save(&record).await?;

        info!(
            "Generated {} bracket for tournament {} ({} entrants)",
            config.format,
            id,
            entrants.len()
        );
        Ok(record.bracket)
    }

    /// Record a played result
    pub async fn submit_result(
        &self,
        id: TournamentId,
        match_id: MatchId,
        score_a: u32,
        score_b: u32,
    ) -> TournamentResult<ProgressionOutcome> {
        self.update(id, |bracket| {
            progression::apply_result(bracket, match_id, score_a, score_b)
        })
        .await
    }

    /// Record a forfeit in favour of `winner`
    pub async fn submit_forfeit(
        &self,
        id: TournamentId,
        match_id: MatchId,
        winner: Side,
    ) -> TournamentResult<ProgressionOutcome> {
        self.update(id, |bracket| progression::apply_forfeit(bracket, match_id, winner))
            .await
    }

    /// Load, apply and store under the tournament's write lock. Nothing is
    /// stored when the engine rejects the change.
    async fn update<F>(&self, id: TournamentId, apply: F) -> TournamentResult<ProgressionOutcome>
    where
        F: FnOnce(&mut MatchSet) -> Result<ProgressionOutcome, BracketError>,
    {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        let mut record = self.load(id).await?;
        let outcome = apply(&mut record.bracket)?;
        record.updated_at = Utc::now();
        self.store.save(&record).await?;

        if let Some(champion) = outcome.champion.as_ref().filter(|_| outcome.completed) {
            info!("Tournament {} finished, champion {}", id, champion);
        }
        Ok(outcome)
    }

    /// Current bracket
    pub async fn get_bracket(&self, id: TournamentId) -> TournamentResult<MatchSet> {
        Ok(self.load(id).await?.bracket)
    }

    /// Tournament summary
    pub async fn get_tournament_info(&self, id: TournamentId) -> TournamentResult<TournamentInfo> {
        Ok(self.load(id).await?.info())
    }

    /// Current standings
    pub async fn get_standings(&self, id: TournamentId) -> TournamentResult<Vec<Standing>> {
        Ok(standings::standings(&self.load(id).await?.bracket))
    }

    /// Every stored tournament
    pub async fn list_tournaments(&self) -> TournamentResult<Vec<TournamentInfo>> {
        let mut infos = Vec::new();
        for id in self.store.list().await? {
            match self.store.load(id).await? {
                Some(record) => infos.push(record.info()),
                None => warn!("Tournament {} disappeared while listing", id),
            }
        }
        Ok(infos)
    }

    /// Delete a tournament's bracket.
    ///
    /// The tournament's lock is dropped with it only when no other task holds
    /// a handle to the lock; a waiting writer keeps it alive so that it stays
    /// serialized with whoever recreates the tournament.
    pub async fn delete_bracket(&self, id: TournamentId) -> TournamentResult<()> {
        let lock = self.lock_for(id).await;
        let _guard = lock.lock().await;

        if !self.store.delete(id).await? {
            return Err(TournamentError::NotFound(id));
        }

        let mut locks = self.locks.write().await;
        // one reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&id);
        }

        info!("Deleted bracket for tournament {}", id);
        Ok(())
    }
}
