pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{EngineError, EngineResult, StorageError};
pub use models::*;

use crate::config::StorageBackend;
use crate::services::profile::ProfileService;
use crate::services::scoring::ScoringService;
use crate::storage::{JsonFileStorage, MemoryStorage, ProfileStorage};
use anyhow::Result;
use std::sync::Arc;

/// The preference engine: profile store plus scoring engine wired to one
/// storage backend. Construct once and share; all methods take `&self`.
#[derive(Clone)]
pub struct Engine {
    pub config: Arc<Config>,
    pub storage: Arc<dyn ProfileStorage>,
    pub profile_service: Arc<ProfileService>,
    pub scoring_service: Arc<ScoringService>,
}

impl Engine {
    pub fn new(config: Config) -> Result<Self> {
        let storage: Arc<dyn ProfileStorage> = match config.storage.backend {
            StorageBackend::Json => Arc::new(JsonFileStorage::new(&config.storage.data_dir)?),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Ok(Self::with_storage(config, storage))
    }

    /// Builds the engine around an injected storage implementation.
    pub fn with_storage(config: Config, storage: Arc<dyn ProfileStorage>) -> Self {
        let config = Arc::new(config);

        let profile_service = Arc::new(ProfileService::new(storage.clone(), config.clone()));

        let scoring_service = Arc::new(ScoringService::new(
            profile_service.clone(),
            config.clone(),
        ));

        Self {
            config,
            storage,
            profile_service,
            scoring_service,
        }
    }

    pub async fn rank(
        &self,
        user_id: &str,
        candidates: Vec<Restaurant>,
        dietary_restrictions: &[String],
    ) -> EngineResult<Vec<ScoredRestaurant>> {
        self.scoring_service
            .rank(user_id, candidates, dietary_restrictions)
            .await
    }

    pub async fn record_interaction(
        &self,
        user_id: &str,
        restaurant: &Restaurant,
        kind: InteractionKind,
        rating: Option<f32>,
        trip_id: Option<String>,
    ) -> EngineResult<Interaction> {
        self.profile_service
            .record_interaction(user_id, restaurant, kind, rating, trip_id)
            .await
    }

    pub async fn record_feedback(
        &self,
        user_id: &str,
        restaurant: &Restaurant,
        feedback: &Feedback,
        trip_id: Option<String>,
    ) -> EngineResult<Interaction> {
        self.profile_service
            .record_feedback(user_id, restaurant, feedback, trip_id)
            .await
    }

    pub async fn get_profile(&self, user_id: &str) -> EngineResult<UserProfile> {
        self.profile_service.get_profile(user_id).await
    }

    pub async fn get_history(&self, user_id: &str) -> EngineResult<Vec<Interaction>> {
        self.profile_service.get_history(user_id).await
    }

    pub async fn reset(&self, user_id: &str) -> EngineResult<()> {
        self.profile_service.reset(user_id).await
    }

    pub async fn insights(&self, user_id: &str) -> EngineResult<ProfileInsights> {
        self.profile_service.insights(user_id).await
    }

    pub async fn stats(&self) -> EngineResult<EngineStats> {
        self.profile_service.stats().await
    }
}

pub async fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
