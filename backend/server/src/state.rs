use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::{
    aggregate::Aggregator,
    checker::{HttpChecker, InteractionChecker},
    config::Config,
    database::{RedisHistoryStore, init_redis},
    store::{HistoryStore, MemoryHistoryStore},
};

pub struct State {
    pub config: Config,
    pub aggregator: Aggregator,
    pub store: Arc<dyn HistoryStore>,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>> {
        let store: Arc<dyn HistoryStore> = match &config.redis_url {
            Some(redis_url) => {
                info!("Connecting to Redis...");
                Arc::new(RedisHistoryStore::new(init_redis(redis_url).await?))
            }
            None => {
                warn!("REDIS_URL not set, history is kept in memory only");
                Arc::new(MemoryHistoryStore::new())
            }
        };

        info!("Checking interactions against {}", config.checker_url);
        let checker = Arc::new(HttpChecker::new(&config.checker_url));

        Ok(Self::with_parts(config, checker, store))
    }

    pub fn with_parts(
        config: Config,
        checker: Arc<dyn InteractionChecker>,
        store: Arc<dyn HistoryStore>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            aggregator: Aggregator::new(checker),
            store,
        })
    }
}
