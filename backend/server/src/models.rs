//! # Payloads
//!
//! Structures shared between the routes, the aggregator, and the store.
//!
//! ## Scalar or List
//!
//! Clients may send `drug` and `food` either as a bare string or as an array
//! of strings. Both shapes are captured by [`OneOrMany`] and flattened into a
//! `Vec` before anything else looks at them.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InteractionsRequest {
    pub uid: Option<String>,
    pub drug: Option<OneOrMany<String>>,
    pub food: Option<OneOrMany<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UidQuery {
    pub uid: Option<String>,
}

/// One evaluated drug/food pair. `result` is whatever the checker returned.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct InteractionResult {
    pub drug: String,
    pub food: String,
    pub result: Value,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub uid: String,
    pub interactions: Vec<InteractionResult>,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn new(uid: &str, interactions: Vec<InteractionResult>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            uid: uid.to_string(),
            interactions,
            created_at: Utc::now(),
        }
    }
}
