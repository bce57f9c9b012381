//! # Redis
//!
//! Document store for interaction history.
//!
//! Core purpose is to keep every aggregation result per user and hand them
//! back newest-first. Records are written once and never modified.
//!
//! ## Requirements
//!
//! - Many records per user, no uniqueness on uid
//! - Newest-first listing without sorting on read
//! - Single delete by id, bulk delete by user
//!
//! ## Implementation
//!
//! - Record documents: `history:record:{id}` holding the JSON record
//! - User index: `history:user:{uid}`, a list of record ids
//! - `LPUSH` on create so `LRANGE 0 -1` is already newest-first
//! - Create and delete are `MULTI`/`EXEC` pipelines, so a record and its
//!   index entry appear and disappear together
//! - Bulk delete removes exactly the ids it read, so a record created
//!   concurrently for the same user survives
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use redis::{
    AsyncCommands, Client,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::{debug, instrument, warn};

use crate::{
    models::{HistoryRecord, InteractionResult},
    store::{HistoryStore, StoreError, StoreResult},
};

pub const RECORD_PREFIX: &str = "history:record:";
pub const USER_PREFIX: &str = "history:user:";

pub async fn init_redis(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(500));

    let client = Client::open(redis_url).context("invalid Redis URL")?;
    let connection_manager = client
        .get_connection_manager_with_config(config)
        .await
        .context("connecting to Redis")?;

    Ok(connection_manager)
}

fn record_key(id: &str) -> String {
    format!("{RECORD_PREFIX}{id}")
}

fn user_key(uid: &str) -> String {
    format!("{USER_PREFIX}{uid}")
}

#[derive(Clone)]
pub struct RedisHistoryStore {
    connection: ConnectionManager,
}

impl RedisHistoryStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    #[instrument(skip(self, interactions))]
    async fn create(
        &self,
        uid: &str,
        interactions: Vec<InteractionResult>,
    ) -> StoreResult<HistoryRecord> {
        let record = HistoryRecord::new(uid, interactions);
        let document = serde_json::to_string(&record)?;

        let mut connection = self.connection.clone();
        let (): () = redis::pipe()
            .atomic()
            .set(record_key(&record.id), document)
            .ignore()
            .lpush(user_key(uid), &record.id)
            .ignore()
            .query_async(&mut connection)
            .await?;

        debug!("Stored record {}", record.id);
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn list_by_user(&self, uid: &str) -> StoreResult<Vec<HistoryRecord>> {
        let mut connection = self.connection.clone();
        let ids: Vec<String> = connection.lrange(user_key(uid), 0, -1).await?;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.get(record_key(id));
        }
        let documents: Vec<Option<String>> = pipe.query_async(&mut connection).await?;

        let mut records = Vec::with_capacity(documents.len());
        for (id, document) in ids.iter().zip(documents) {
            match document {
                Some(document) => records.push(serde_json::from_str(&document)?),
                None => warn!("Dangling history index entry {id} for {uid}"),
            }
        }

        Ok(records)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let mut connection = self.connection.clone();

        let document: Option<String> = connection.get(record_key(id)).await?;
        let record: HistoryRecord = match document {
            Some(document) => serde_json::from_str(&document)?,
            None => return Err(StoreError::NotFound { id: id.to_string() }),
        };

        let (removed,): (u64,) = redis::pipe()
            .atomic()
            .del(record_key(id))
            .lrem(user_key(&record.uid), 1, id)
            .ignore()
            .query_async(&mut connection)
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_all_by_user(&self, uid: &str) -> StoreResult<u64> {
        let mut connection = self.connection.clone();
        let ids: Vec<String> = connection.lrange(user_key(uid), 0, -1).await?;

        if ids.is_empty() {
            return Ok(0);
        }

        let keys: Vec<String> = ids.iter().map(|id| record_key(id)).collect();

        let mut pipe = redis::pipe();
        pipe.atomic().del(keys);
        for id in &ids {
            pipe.lrem(user_key(uid), 1, id).ignore();
        }
        let (removed,): (u64,) = pipe.query_async(&mut connection).await?;

        Ok(removed)
    }
}
