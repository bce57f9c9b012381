use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_CHECKER_URL: &str = "https://aura-health-70db.onrender.com";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
    pub checker_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            port: try_load("PORT", "4000")?,
            redis_url: var("REDIS_URL").ok().or_else(|| read_secret("REDIS_URL")),
            checker_url: try_load::<String>("CHECKER_URL", DEFAULT_CHECKER_URL)?
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}

fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .with_context(|| format!("reading {path}"))
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e:#}");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_load_falls_back_to_default() {
        let port: u16 = try_load("HISTORY_TEST_UNSET_PORT", "4000").unwrap();
        assert_eq!(port, 4000);
    }

    #[test]
    fn test_try_load_rejects_garbage_default() {
        let port = try_load::<u16>("HISTORY_TEST_UNSET_PORT", "not-a-port");
        assert!(port.is_err());
    }

    #[test]
    fn test_missing_secret_is_none() {
        assert_eq!(read_secret("HISTORY_TEST_MISSING_SECRET"), None);
    }
}
