//! History store abstraction.
//!
//! Records are created, listed, and deleted. Never updated.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{HistoryRecord, InteractionResult};

pub mod memory;

pub use memory::MemoryHistoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("History record not found: {id}")]
    NotFound { id: String },

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt history document: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent history keyed by user.
///
/// Implementations must return [`HistoryStore::list_by_user`] newest-first.
#[async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    /// Stores a new record with a fresh id and the current time.
    async fn create(&self, uid: &str, interactions: Vec<InteractionResult>)
    -> StoreResult<HistoryRecord>;

    /// All records for `uid`, newest first. Empty when the user has none.
    async fn list_by_user(&self, uid: &str) -> StoreResult<Vec<HistoryRecord>>;

    /// Removes one record, [`StoreError::NotFound`] if `id` is unknown.
    async fn delete_by_id(&self, id: &str) -> StoreResult<()>;

    /// Removes every record for `uid` and returns how many were removed.
    async fn delete_all_by_user(&self, uid: &str) -> StoreResult<u64>;
}
