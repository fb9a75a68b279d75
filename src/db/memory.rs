use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{seed, CatalogStore, MoodStore, Store, StoreResult, UserStore};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::recommendation::Recommendation;
use crate::models::user::{NewUser, User};

/// Process-local store used when PostgreSQL is absent or failing.
/// Writes are kept for the lifetime of the process only.
pub struct MemoryStore {
    moods: RwLock<Vec<MoodEntry>>,
    users: RwLock<Vec<User>>,
    catalog: Vec<Recommendation>,
}

impl MemoryStore {
    pub fn with_data(
        moods: Vec<MoodEntry>,
        users: Vec<User>,
        catalog: Vec<Recommendation>,
    ) -> Self {
        Self {
            moods: RwLock::new(moods),
            users: RwLock::new(users),
            catalog,
        }
    }

    /// Store pre-filled with the demo users, moods and full catalog.
    pub fn seeded() -> anyhow::Result<Self> {
        let now = Utc::now();
        let users = seed::users(now)?
            .into_iter()
            .zip(1..)
            .map(|(user, id)| user.into_user(id))
            .collect();

        Ok(Self::with_data(
            seed::mood_records(now),
            users,
            seed::recommendation_catalog(),
        ))
    }
}

#[async_trait]
impl MoodStore for MemoryStore {
    async fn moods_for_user(&self, user_id: i64) -> StoreResult<Vec<MoodEntry>> {
        let mut moods: Vec<MoodEntry> = self
            .moods
            .read()
            .await
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        moods.sort_by_key(|m| m.recorded_at);
        Ok(moods)
    }

    async fn all_moods(&self) -> StoreResult<Vec<MoodEntry>> {
        Ok(self.moods.read().await.clone())
    }

    async fn find_mood(&self, id: i64) -> StoreResult<Option<MoodEntry>> {
        Ok(self.moods.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn record_mood(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        let mut moods = self.moods.write().await;
        let id = moods.iter().map(|m| m.id).max().unwrap_or(0) + 1;
        let entry = entry.into_entry(id);
        moods.push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        let user = user.into_user(id);
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.users.read().await.len() as i64)
    }

    async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.users.write().await.iter_mut().find(|u| u.id == id) {
            user.last_login_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn recommendations(&self) -> StoreResult<Vec<Recommendation>> {
        Ok(self.catalog.clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
