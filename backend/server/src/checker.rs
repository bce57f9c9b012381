//! # Interaction Checker
//!
//! Remote service that judges a single drug/food pair.
//!
//! ## Contract
//!
//! - `POST {base}/check-meal` with `{"drug": ..., "food": ...}`
//! - Any 2xx carries a JSON verdict, kept as-is
//! - Anything else is a failure for that pair
//!
//! No retries and no per-call timeout. A slow checker makes a slow request.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinError;

pub const CHECK_MEAL_PATH: &str = "/check-meal";

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Checker request for {drug}/{food} failed: {source}")]
    Transport {
        drug: String,
        food: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Checker returned {status} for {drug}/{food}")]
    Status {
        drug: String,
        food: String,
        status: StatusCode,
    },

    #[error("Checker verdict for {drug}/{food} is not JSON: {source}")]
    Decode {
        drug: String,
        food: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Lookup task failed: {0}")]
    Task(#[from] JoinError),
}

#[async_trait]
pub trait InteractionChecker: Send + Sync + 'static {
    async fn check(&self, drug: &str, food: &str) -> Result<Value, CheckError>;
}

#[derive(Serialize)]
struct CheckMeal<'a> {
    drug: &'a str,
    food: &'a str,
}

pub struct HttpChecker {
    client: Client,
    endpoint: String,
}

impl HttpChecker {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}{CHECK_MEAL_PATH}", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl InteractionChecker for HttpChecker {
    async fn check(&self, drug: &str, food: &str) -> Result<Value, CheckError> {
        let transport = |source| CheckError::Transport {
            drug: drug.to_string(),
            food: food.to_string(),
            source,
        };

        let res = self
            .client
            .post(&self.endpoint)
            .json(&CheckMeal { drug, food })
            .send()
            .await
            .map_err(transport)?;

        if !res.status().is_success() {
            return Err(CheckError::Status {
                drug: drug.to_string(),
                food: food.to_string(),
                status: res.status(),
            });
        }

        res.json::<Value>().await.map_err(|source| CheckError::Decode {
            drug: drug.to_string(),
            food: food.to_string(),
            source,
        })
    }
}
