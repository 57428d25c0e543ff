use crate::error::StorageError;
use crate::models::{Interaction, UserProfile};
use crate::storage::ProfileStorage;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory backend for tests and embedded callers.
#[derive(Default)]
pub struct MemoryStorage {
    profiles: DashMap<String, UserProfile>,
    histories: DashMap<String, Vec<Interaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStorage for MemoryStorage {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StorageError> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<Interaction>, StorageError> {
        Ok(self
            .histories
            .get(user_id)
            .map(|h| h.clone())
            .unwrap_or_default())
    }

    async fn save_history(
        &self,
        user_id: &str,
        history: &[Interaction],
    ) -> Result<(), StorageError> {
        self.histories.insert(user_id.to_string(), history.to_vec());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError> {
        self.profiles.remove(user_id);
        self.histories.remove(user_id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<String>, StorageError> {
        let mut users: Vec<String> = self
            .profiles
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.histories.iter().map(|entry| entry.key().clone()))
            .collect();
        users.sort();
        users.dedup();
        Ok(users)
    }
}
