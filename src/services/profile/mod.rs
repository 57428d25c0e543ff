use crate::config::Config;
use crate::error::EngineResult;
use crate::models::*;
use crate::storage::ProfileStorage;
use crate::utils::validation::{validate_user_id, validate_user_rating};
use dashmap::DashMap;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// The profile store. Owns per-user affinity state and the bounded interaction
/// history behind it; all mutation goes through `record_interaction` or
/// `reset`, serialized per user so concurrent updates for the same user never
/// lose writes.
pub struct ProfileService {
    storage: Arc<dyn ProfileStorage>,
    config: Arc<Config>,
    profiles_cache: DashMap<String, UserProfile>,
    user_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ProfileService {
    pub fn new(storage: Arc<dyn ProfileStorage>, config: Arc<Config>) -> Self {
        Self {
            storage,
            config,
            profiles_cache: DashMap::new(),
            user_locks: DashMap::new(),
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Appends an interaction to the user's history and, for selections and
    /// visits, folds it into the affinity sub-models. History, profile, and
    /// running totals move in one read-modify-write under the user's lock.
    pub async fn record_interaction(
        &self,
        user_id: &str,
        restaurant: &Restaurant,
        kind: InteractionKind,
        rating: Option<f32>,
        trip_id: Option<String>,
    ) -> EngineResult<Interaction> {
        validate_user_id(user_id)?;
        validate_user_rating(rating)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut profile = match self.storage.load_profile(user_id).await? {
            Some(profile) => profile,
            None => {
                info!("bootstrapping profile for user {}", user_id);
                UserProfile::new(user_id)
            }
        };

        let interaction = Interaction::from_parts(user_id, restaurant, kind, rating, trip_id);

        let mut history = self.storage.load_history(user_id).await?;
        history.push(interaction.clone());
        let cap = self.config.profile.max_history_per_user;
        if cap > 0 && history.len() > cap {
            let excess = history.len() - cap;
            history.drain(..excess);
        }

        profile.record(&interaction);

        self.storage.save_history(user_id, &history).await?;
        self.storage.save_profile(&profile).await?;
        self.profiles_cache.insert(user_id.to_string(), profile);

        debug!(
            "recorded {:?} interaction with {} for user {}",
            kind, interaction.restaurant_id, user_id
        );
        Ok(interaction)
    }

    /// Convenience for app-layer feedback reports: maps the feedback onto an
    /// interaction kind and records it.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        restaurant: &Restaurant,
        feedback: &Feedback,
        trip_id: Option<String>,
    ) -> EngineResult<Interaction> {
        let kind = InteractionKind::from_feedback(feedback);
        self.record_interaction(user_id, restaurant, kind, feedback.rating, trip_id)
            .await
    }

    /// Returns the stored profile, or a freshly initialized empty one for
    /// unknown users. Reading never creates storage records.
    pub async fn get_profile(&self, user_id: &str) -> EngineResult<UserProfile> {
        validate_user_id(user_id)?;

        if let Some(profile) = self.profiles_cache.get(user_id) {
            return Ok(profile.clone());
        }

        match self.storage.load_profile(user_id).await? {
            Some(profile) => {
                self.profiles_cache
                    .insert(user_id.to_string(), profile.clone());
                Ok(profile)
            }
            None => Ok(UserProfile::new(user_id)),
        }
    }

    /// The user's bounded interaction history, oldest first.
    pub async fn get_history(&self, user_id: &str) -> EngineResult<Vec<Interaction>> {
        validate_user_id(user_id)?;
        Ok(self.storage.load_history(user_id).await?)
    }

    /// Clears profile and history for a user. Safe to call repeatedly.
    pub async fn reset(&self, user_id: &str) -> EngineResult<()> {
        validate_user_id(user_id)?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        self.storage.delete_user(user_id).await?;
        self.profiles_cache.remove(user_id);

        info!("reset learning data for user {}", user_id);
        Ok(())
    }

    /// Derived statistics for a user: top cuisines, preferred distance bucket
    /// and price level, interaction and trip counts.
    pub async fn insights(&self, user_id: &str) -> EngineResult<ProfileInsights> {
        let profile = self.get_profile(user_id).await?;
        Ok(ProfileInsights::from_profile(&profile))
    }

    /// Store-wide totals across all users.
    pub async fn stats(&self) -> EngineResult<EngineStats> {
        let users = self.storage.list_users().await?;
        let histories = join_all(
            users
                .iter()
                .map(|user_id| self.storage.load_history(user_id)),
        )
        .await;

        let mut total_interactions = 0u64;
        for history in histories {
            total_interactions += history?.len() as u64;
        }

        Ok(EngineStats {
            total_users: users.len(),
            total_interactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn service() -> ProfileService {
        ProfileService::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(Config::default()),
        )
    }

    fn italian(id: &str) -> Restaurant {
        Restaurant::new(id, "Luigi's")
            .with_cuisines(vec!["italian".to_string()])
            .with_rating(4.5)
            .with_distance(2.0)
            .with_price_level(2)
    }

    #[test]
    fn test_record_updates_profile() {
        let service = service();
        tokio_test::block_on(async {
            service
                .record_interaction("u1", &italian("r1"), InteractionKind::Selected, Some(5.0), None)
                .await
                .unwrap();

            let profile = service.get_profile("u1").await.unwrap();
            assert_eq!(profile.total_interactions, 1);
            assert_eq!(profile.distance_affinity.total_selections, 1);
            assert_eq!(profile.cuisine_affinity.get("italian").unwrap().selections, 1);
            assert_eq!(profile.price_affinity.total_selections, 1);
            assert!(profile.last_interaction_at.is_some());
        });
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let service = service();
        tokio_test::block_on(async {
            let result = service
                .record_interaction("", &italian("r1"), InteractionKind::Selected, None, None)
                .await;
            assert!(result.is_err());
        });
    }

    #[test]
    fn test_history_bounded_fifo() {
        let mut config = Config::default();
        config.profile.max_history_per_user = 10;
        let service = ProfileService::new(Arc::new(MemoryStorage::new()), Arc::new(config));

        tokio_test::block_on(async {
            for i in 0..60 {
                let restaurant = Restaurant::new(format!("r{i}"), format!("Stop {i}"));
                service
                    .record_interaction("u1", &restaurant, InteractionKind::Selected, None, None)
                    .await
                    .unwrap();
            }

            let history = service.get_history("u1").await.unwrap();
            assert_eq!(history.len(), 10);
            assert_eq!(history.first().unwrap().restaurant_id, "r50");
            assert_eq!(history.last().unwrap().restaurant_id, "r59");
        });
    }

    #[test]
    fn test_reset_idempotent() {
        let service = service();
        tokio_test::block_on(async {
            service
                .record_interaction("u1", &italian("r1"), InteractionKind::Selected, None, None)
                .await
                .unwrap();

            service.reset("u1").await.unwrap();
            service.reset("u1").await.unwrap();

            let profile = service.get_profile("u1").await.unwrap();
            assert_eq!(profile.total_interactions, 0);
            assert_eq!(profile.distance_affinity.total_selections, 0);
            assert!(service.get_history("u1").await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_get_profile_does_not_persist_fresh_users() {
        let storage = Arc::new(MemoryStorage::new());
        let service = ProfileService::new(storage.clone(), Arc::new(Config::default()));
        tokio_test::block_on(async {
            let profile = service.get_profile("ghost").await.unwrap();
            assert_eq!(profile.total_interactions, 0);
            assert!(storage.load_profile("ghost").await.unwrap().is_none());
            assert!(storage.list_users().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_concurrent_interactions_same_user_lose_nothing() {
        let service = Arc::new(service());
        tokio_test::block_on(async {
            let mut handles = Vec::new();
            for i in 0..20 {
                let service = service.clone();
                handles.push(tokio::spawn(async move {
                    let restaurant = Restaurant::new(format!("r{i}"), "Racy Diner")
                        .with_cuisines(vec!["bbq".to_string()]);
                    service
                        .record_interaction("u1", &restaurant, InteractionKind::Selected, None, None)
                        .await
                        .unwrap();
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            let profile = service.get_profile("u1").await.unwrap();
            assert_eq!(profile.total_interactions, 20);
            assert_eq!(profile.cuisine_affinity.get("bbq").unwrap().selections, 20);
            assert_eq!(service.get_history("u1").await.unwrap().len(), 20);
        });
    }

    #[test]
    fn test_insights_and_stats() {
        let service = service();
        tokio_test::block_on(async {
            for _ in 0..3 {
                service
                    .record_interaction(
                        "u1",
                        &italian("r1"),
                        InteractionKind::Selected,
                        Some(5.0),
                        Some("trip-1".to_string()),
                    )
                    .await
                    .unwrap();
            }
            let thai = Restaurant::new("r2", "Thai Spoon")
                .with_cuisines(vec!["thai".to_string()])
                .with_price_level(3);
            service
                .record_interaction("u1", &thai, InteractionKind::Visited, None, Some("trip-2".to_string()))
                .await
                .unwrap();

            let insights = service.insights("u1").await.unwrap();
            assert_eq!(insights.total_interactions, 4);
            assert_eq!(insights.trip_count, 2);
            assert_eq!(insights.top_cuisines.first().map(String::as_str), Some("italian"));
            assert_eq!(insights.preferred_price_level, Some(2));
            let preferred = insights.preferred_distance.unwrap();
            assert_eq!((preferred.min_miles, preferred.max_miles), (1.0, 3.0));

            let stats = service.stats().await.unwrap();
            assert_eq!(stats.total_users, 1);
            assert_eq!(stats.total_interactions, 4);
        });
    }
}
