use super::store::{RecordStore, Shared};
use crate::error::AppResult;
use crate::models::{Tournament, TournamentId};

/// Repository for tournament records (round state and truth store)
pub struct TournamentRepository {
    store: RecordStore<Tournament>,
}

impl TournamentRepository {
    /// Create a new, empty TournamentRepository
    pub fn new() -> Self {
        Self {
            store: RecordStore::new("Tournament"),
        }
    }

    /// Register a tournament built by the administration
    pub async fn create(&self, tournament: Tournament) -> AppResult<Shared<Tournament>> {
        self.store.insert(tournament.id, tournament).await
    }

    /// A missing tournament is an error
    pub async fn get(&self, id: TournamentId) -> AppResult<Shared<Tournament>> {
        self.store.get(id).await
    }

    pub async fn snapshot(&self, id: TournamentId) -> AppResult<Tournament> {
        self.store.snapshot(id).await
    }

    pub async fn list_ids(&self) -> Vec<TournamentId> {
        self.store.ids().await
    }
}

impl Default for TournamentRepository {
    fn default() -> Self {
        Self::new()
    }
}
