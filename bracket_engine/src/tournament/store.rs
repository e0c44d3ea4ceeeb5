//! Storage trait for brackets, with an in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::manager::TournamentResult;
use super::models::{TournamentId, TournamentRecord};

/// Persistence for tournament brackets.
///
/// Implementations only store and fetch whole records; all bracket logic
/// stays in the engine.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Fetch a record
    async fn load(&self, id: TournamentId) -> TournamentResult<Option<TournamentRecord>>;

    /// Insert or replace a record
    async fn save(&self, record: &TournamentRecord) -> TournamentResult<()>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, id: TournamentId) -> TournamentResult<bool>;

    /// IDs of every stored record
    async fn list(&self) -> TournamentResult<Vec<TournamentId>>;
}

/// Keeps records as JSON snapshots in memory, so every load goes through
/// the same serialization a real store would.
#[derive(Debug, Default)]
pub struct MemoryMatchStore {
    records: RwLock<HashMap<TournamentId, String>>,
}

impl MemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for MemoryMatchStore {
    async fn load(&self, id: TournamentId) -> TournamentResult<Option<TournamentRecord>> {
        let records = self.records.read().await;
        match records.get(&id) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &TournamentRecord) -> TournamentResult<()> {
        let json = serde_json::to_string(record)?;
        self.records.write().await.insert(record.id, json);
        Ok(())
    }

    async fn delete(&self, id: TournamentId) -> TournamentResult<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn list(&self) -> TournamentResult<Vec<TournamentId>> {
        let mut ids: Vec<TournamentId> = self.records.read().await.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
