use super::store::{RecordStore, Shared};
use crate::error::AppResult;
use crate::models::{Certificate, CertificateId, TournamentId};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

/// Repository for prediction certificates
pub struct CertificateRepository {
    store: RecordStore<Certificate>,
    /// Certificate ids per tournament; a certificate never changes tournament
    by_tournament: RwLock<HashMap<TournamentId, BTreeSet<CertificateId>>>,
}

impl CertificateRepository {
    /// Create a new, empty CertificateRepository
    pub fn new() -> Self {
        Self {
            store: RecordStore::new("Certificate"),
            by_tournament: RwLock::new(HashMap::new()),
        }
    }

    /// Register a certificate issued by the registry
    pub async fn create(&self, certificate: Certificate) -> AppResult<Shared<Certificate>> {
        let (id, tournament_id) = (certificate.id, certificate.tournament_id);
        let handle = self.store.insert(id, certificate).await?;

        self.by_tournament
            .write()
            .await
            .entry(tournament_id)
            .or_default()
            .insert(id);

        Ok(handle)
    }

    pub async fn get(&self, id: CertificateId) -> AppResult<Shared<Certificate>> {
        self.store.get(id).await
    }

    pub async fn snapshot(&self, id: CertificateId) -> AppResult<Certificate> {
        self.store.snapshot(id).await
    }

    /// Ids of every certificate of a tournament, ascending
    pub async fn find_by_tournament(&self, tournament_id: TournamentId) -> Vec<CertificateId> {
        self.by_tournament
            .read()
            .await
            .get(&tournament_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn list_ids(&self) -> Vec<CertificateId> {
        self.store.ids().await
    }
}

impl Default for CertificateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bracket;

    #[tokio::test]
    async fn test_certificates_indexed_by_tournament() {
        let repo = CertificateRepository::new();
        for (id, tournament_id) in [(3, 1), (1, 1), (2, 2)] {
            repo.create(Certificate::new(id, tournament_id, Bracket::new(vec![1], 0)))
                .await
                .unwrap();
        }

        assert_eq!(repo.find_by_tournament(1).await, vec![1, 3]);
        assert_eq!(repo.find_by_tournament(2).await, vec![2]);
        assert!(repo.find_by_tournament(9).await.is_empty());
        assert_eq!(repo.list_ids().await, vec![1, 2, 3]);
    }
}
