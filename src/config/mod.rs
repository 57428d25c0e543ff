use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub profile: ProfileConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Interactions kept per user; oldest events are evicted first.
    pub max_history_per_user: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub rating_weight: f64,
    pub distance_weight: f64,
    pub cuisine_weight: f64,
    pub price_weight: f64,
    /// Applied only when the caller supplies dietary restrictions.
    pub dietary_weight: f64,
    pub max_score: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                backend: StorageBackend::Json,
                data_dir: PathBuf::from("data"),
            },
            profile: ProfileConfig {
                max_history_per_user: 500,
            },
            scoring: ScoringConfig {
                rating_weight: 0.20,
                distance_weight: 0.30,
                cuisine_weight: 0.25,
                price_weight: 0.15,
                dietary_weight: 0.10,
                max_score: 5.0,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("FOODRUNNER"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum() {
        let config = Config::default();
        let sum = config.scoring.rating_weight
            + config.scoring.distance_weight
            + config.scoring.cuisine_weight
            + config.scoring.price_weight
            + config.scoring.dietary_weight;
        assert!((sum - 1.0).abs() < 1e-9);
        assert_eq!(config.profile.max_history_per_user, 500);
        assert_eq!(config.storage.backend, StorageBackend::Json);
    }
}
