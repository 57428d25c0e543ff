pub mod json;
pub mod memory;

pub use json::JsonFileStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use crate::models::{Interaction, UserProfile};
use async_trait::async_trait;

/// Key-value persistence for per-user profile state. One profile record and one
/// bounded history record per user, loaded fully on access and written back
/// fully on mutation.
///
/// Loads report absent or unreadable data as empty rather than failing; only
/// writes and deletes surface errors. Implementations must make writes atomic
/// so a crash mid-write cannot leave a corrupt record behind.
#[async_trait]
pub trait ProfileStorage: Send + Sync {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StorageError>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError>;

    async fn load_history(&self, user_id: &str) -> Result<Vec<Interaction>, StorageError>;

    async fn save_history(
        &self,
        user_id: &str,
        history: &[Interaction],
    ) -> Result<(), StorageError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError>;

    async fn list_users(&self) -> Result<Vec<String>, StorageError>;
}
