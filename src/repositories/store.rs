use crate::error::{option_to_result, AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Handle to a record; holding its lock gives exclusive access for a whole operation
pub type Shared<T> = Arc<Mutex<T>>;

/// Map of id to individually locked records
///
/// The map lock is only held while looking a handle up, never while a record is locked.
pub(crate) struct RecordStore<T> {
    label: &'static str,
    records: RwLock<HashMap<u64, Shared<T>>>,
}

impl<T> RecordStore<T> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new record, ids are never reused
    pub async fn insert(&self, id: u64, record: T) -> AppResult<Shared<T>> {
        let mut records = self.records.write().await;
        if records.contains_key(&id) {
            return Err(AppError::InvariantViolation(format!(
                "{} {} already exists",
                self.label, id
            )));
        }

        let handle = Arc::new(Mutex::new(record));
        records.insert(id, handle.clone());
        Ok(handle)
    }

    pub async fn find(&self, id: u64) -> Option<Shared<T>> {
        self.records.read().await.get(&id).cloned()
    }

    pub async fn get(&self, id: u64) -> AppResult<Shared<T>> {
        option_to_result(
            self.find(id).await,
            &format!("{} {} not found", self.label, id),
        )
    }

    /// All ids, ascending
    pub async fn ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.records.read().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl<T: Clone> RecordStore<T> {
    /// Copy of the record as of now
    pub async fn snapshot(&self, id: u64) -> AppResult<T> {
        let handle = self.get(id).await?;
        let record = handle.lock().await.clone();
        Ok(record)
    }
}
