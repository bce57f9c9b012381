//! # Pair Aggregation
//!
//! Every drug is checked against every food.
//!
//! ## Ordering
//!
//! Pairs are generated drug-major: all foods for the first drug, then all
//! foods for the second, and so on. Lookups finish in any order, so each task
//! carries its slot index and results are placed back by index.
//!
//! ## Failure
//!
//! All or nothing. The first failed lookup ends the aggregation and the
//! remaining lookups are aborted when the task set is dropped.
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    checker::{CheckError, InteractionChecker},
    models::InteractionResult,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Pair {
    pub drug: String,
    pub food: String,
}

pub fn cross_pairs(drugs: &[String], foods: &[String]) -> Vec<Pair> {
    drugs
        .iter()
        .flat_map(|drug| {
            foods.iter().map(move |food| Pair {
                drug: drug.clone(),
                food: food.clone(),
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct Aggregator {
    checker: Arc<dyn InteractionChecker>,
}

impl Aggregator {
    pub fn new(checker: Arc<dyn InteractionChecker>) -> Self {
        Self { checker }
    }

    pub async fn aggregate(
        &self,
        drugs: &[String],
        foods: &[String],
    ) -> Result<Vec<InteractionResult>, CheckError> {
        let pairs = cross_pairs(drugs, foods);
        let total = pairs.len();

        debug!("Dispatching {total} pair lookups");

        let mut tasks = JoinSet::new();
        for (index, pair) in pairs.into_iter().enumerate() {
            let checker = Arc::clone(&self.checker);

            tasks.spawn(async move {
                let verdict = checker.check(&pair.drug, &pair.food).await;
                (index, pair, verdict)
            });
        }

        let mut slots: Vec<Option<InteractionResult>> = vec![None; total];

        while let Some(joined) = tasks.join_next().await {
            let (index, pair, verdict) = joined?;

            let result = verdict.inspect_err(|e| {
                warn!("Aborting {} remaining lookups: {e}", tasks.len());
            })?;

            slots[index] = Some(InteractionResult {
                drug: pair.drug,
                food: pair.food,
                result,
            });
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::{Value, json};

    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Answers with the pair itself. Earlier drugs answer later so completion
    /// order is the reverse of generation order.
    struct EchoChecker {
        calls: AtomicUsize,
        fail_on: Option<(&'static str, &'static str)>,
    }

    impl EchoChecker {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }

        fn failing_on(drug: &'static str, food: &'static str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: Some((drug, food)),
            }
        }
    }

    #[async_trait]
    impl InteractionChecker for EchoChecker {
        async fn check(&self, drug: &str, food: &str) -> Result<Value, CheckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let delay = match drug {
                "d1" => 30,
                "d2" => 15,
                _ => 0,
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;

            if self.fail_on == Some((drug, food)) {
                return Err(CheckError::Status {
                    drug: drug.to_string(),
                    food: food.to_string(),
                    status: StatusCode::BAD_GATEWAY,
                });
            }

            Ok(json!({ "pair": format!("{drug}+{food}") }))
        }
    }

    #[test]
    fn test_cross_pairs_drug_major() {
        let pairs = cross_pairs(&names(&["d1", "d2"]), &names(&["f1", "f2"]));
        let flat: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.drug.as_str(), p.food.as_str()))
            .collect();

        assert_eq!(flat, vec![("d1", "f1"), ("d1", "f2"), ("d2", "f1"), ("d2", "f2")]);
    }

    #[test]
    fn test_cross_pairs_keeps_duplicates() {
        let pairs = cross_pairs(&names(&["d1", "d1"]), &names(&["f1"]));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], pairs[1]);
    }

    #[tokio::test]
    async fn test_results_follow_generation_order() {
        let checker = Arc::new(EchoChecker::new());
        let aggregator = Aggregator::new(checker.clone());

        let results = aggregator
            .aggregate(&names(&["d1", "d2", "d3"]), &names(&["f1", "f2"]))
            .await
            .unwrap();

        assert_eq!(results.len(), 6);
        assert_eq!(checker.calls.load(Ordering::SeqCst), 6);

        let order: Vec<String> = results
            .iter()
            .map(|r| r.result["pair"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(order, vec!["d1+f1", "d1+f2", "d2+f1", "d2+f2", "d3+f1", "d3+f2"]);

        for r in &results {
            assert_eq!(r.result["pair"], format!("{}+{}", r.drug, r.food));
        }
    }

    #[tokio::test]
    async fn test_single_failure_fails_everything() {
        let aggregator = Aggregator::new(Arc::new(EchoChecker::failing_on("d3", "f2")));

        let err = aggregator
            .aggregate(&names(&["d1", "d2", "d3"]), &names(&["f1", "f2"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckError::Status { ref drug, ref food, .. } if drug == "d3" && food == "f2"
        ));
    }

    /// Fails `bad` at once; every other food finishes only after a delay.
    struct SlowSiblingsChecker {
        finished: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl InteractionChecker for SlowSiblingsChecker {
        async fn check(&self, drug: &str, food: &str) -> Result<Value, CheckError> {
            if food == "bad" {
                return Err(CheckError::Status {
                    drug: drug.to_string(),
                    food: food.to_string(),
                    status: StatusCode::BAD_GATEWAY,
                });
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);

            Ok(json!({ "risk": "SAFE" }))
        }
    }

    #[tokio::test]
    async fn test_failure_aborts_in_flight_siblings() {
        let finished = Arc::new(AtomicUsize::new(0));
        let aggregator = Aggregator::new(Arc::new(SlowSiblingsChecker {
            finished: finished.clone(),
        }));

        let err = aggregator
            .aggregate(&names(&["d"]), &names(&["a", "bad", "c"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::Status { .. }));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_scalar_inputs_give_one_result() {
        let aggregator = Aggregator::new(Arc::new(EchoChecker::new()));

        let results = aggregator
            .aggregate(&names(&["warfarin"]), &names(&["spinach"]))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].drug, "warfarin");
        assert_eq!(results[0].food, "spinach");
    }
}
