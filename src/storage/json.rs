use crate::error::StorageError;
use crate::models::{Interaction, UserProfile};
use crate::storage::ProfileStorage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One profile JSON file and one history JSON file per user under a data
/// directory. Writes go to a temp file first and are renamed into place, so a
/// crash mid-write leaves the previous record intact.
pub struct JsonFileStorage {
    profiles_dir: PathBuf,
    history_dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let data_dir = data_dir.into();
        let profiles_dir = data_dir.join("profiles");
        let history_dir = data_dir.join("history");
        for dir in [&profiles_dir, &history_dir] {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Write {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self {
            profiles_dir,
            history_dir,
        })
    }

    fn profile_path(&self, user_id: &str) -> PathBuf {
        self.profiles_dir
            .join(format!("{}.json", encode_user_id(user_id)))
    }

    fn history_path(&self, user_id: &str) -> PathBuf {
        self.history_dir
            .join(format!("{}.json", encode_user_id(user_id)))
    }
}

/// User ids become file names, so every byte outside `[A-Za-z0-9._-]` is
/// percent-escaped. The encoding is reversible for `list_users`.
fn encode_user_id(user_id: &str) -> String {
    let mut encoded = String::with_capacity(user_id.len());
    for &byte in user_id.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                encoded.push(byte as char);
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

fn decode_user_id(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Missing or unreadable records load as `None`; the caller bootstraps an
/// empty profile from that.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("unreadable record at {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_slice(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("corrupt record at {}: {}", path.display(), e);
            None
        }
    }
}

async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let contents = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &contents)
        .await
        .map_err(|source| StorageError::Write {
            path: tmp_path.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        })
}

async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StorageError::Delete {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn users_in_dir(dir: &Path, users: &mut Vec<String>) -> Result<(), StorageError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(StorageError::List)?;
    while let Some(entry) = entries.next_entry().await.map_err(StorageError::List)? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(stem) = name.strip_suffix(".json") else {
            continue;
        };
        if let Some(user_id) = decode_user_id(stem) {
            users.push(user_id);
        }
    }
    Ok(())
}

#[async_trait]
impl ProfileStorage for JsonFileStorage {
    async fn load_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StorageError> {
        Ok(read_json(&self.profile_path(user_id)).await)
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        write_json_atomic(&self.profile_path(&profile.user_id), profile).await
    }

    async fn load_history(&self, user_id: &str) -> Result<Vec<Interaction>, StorageError> {
        Ok(read_json(&self.history_path(user_id)).await.unwrap_or_default())
    }

    async fn save_history(
        &self,
        user_id: &str,
        history: &[Interaction],
    ) -> Result<(), StorageError> {
        write_json_atomic(&self.history_path(user_id), &history).await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StorageError> {
        remove_if_present(&self.profile_path(user_id)).await?;
        remove_if_present(&self.history_path(user_id)).await
    }

    async fn list_users(&self) -> Result<Vec<String>, StorageError> {
        let mut users = Vec::new();
        users_in_dir(&self.profiles_dir, &mut users).await?;
        users_in_dir(&self.history_dir, &mut users).await?;
        users.sort();
        users.dedup();
        Ok(users)
    }
}
