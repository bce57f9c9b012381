//! In-process history store.
//!
//! Used when no Redis URL is configured and throughout the tests. Records
//! live per user in insertion order; listing reverses that.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::instrument;

use super::{HistoryStore, StoreError, StoreResult};
use crate::models::{HistoryRecord, InteractionResult};

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: DashMap<String, Vec<HistoryRecord>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    #[instrument(skip(self, interactions))]
    async fn create(
        &self,
        uid: &str,
        interactions: Vec<InteractionResult>,
    ) -> StoreResult<HistoryRecord> {
        let record = HistoryRecord::new(uid, interactions);

        self.records
            .entry(uid.to_string())
            .or_default()
            .push(record.clone());

        Ok(record)
    }

    async fn list_by_user(&self, uid: &str) -> StoreResult<Vec<HistoryRecord>> {
        Ok(self
            .records
            .get(uid)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let mut owner = None;
        for mut entry in self.records.iter_mut() {
            if let Some(position) = entry.iter().position(|r| r.id == id) {
                entry.remove(position);
                owner = Some(entry.key().clone());
                break;
            }
        }

        // Drop the user once their last record is gone.
        match owner {
            Some(uid) => {
                self.records.remove_if(&uid, |_, records| records.is_empty());
                Ok(())
            }
            None => Err(StoreError::NotFound { id: id.to_string() }),
        }
    }

    async fn delete_all_by_user(&self, uid: &str) -> StoreResult<u64> {
        Ok(self
            .records
            .remove(uid)
            .map(|(_, records)| records.len() as u64)
            .unwrap_or(0))
    }
}
