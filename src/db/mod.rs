//! Persistence for users, mood entries and the recommendation catalog.
//!
//! Two backends implement [`Store`]: [`postgres::PgStore`] and the in-memory
//! [`memory::MemoryStore`] seeded with demo data. [`Repository`] runs every
//! call against PostgreSQL under a timeout and transparently serves the
//! in-memory data when the database is missing, unreachable or slow.

pub mod memory;
pub mod pool;
pub mod postgres;
pub mod seed;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::recommendation::Recommendation;
use crate::models::user::{NewUser, User};

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait MoodStore: Send + Sync {
    /// Entries for one user, oldest first.
    async fn moods_for_user(&self, user_id: i64) -> StoreResult<Vec<MoodEntry>>;
    async fn all_moods(&self) -> StoreResult<Vec<MoodEntry>>;
    async fn find_mood(&self, id: i64) -> StoreResult<Option<MoodEntry>>;
    async fn record_mood(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn users(&self) -> StoreResult<Vec<User>>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Replaces the stored user with the same id. `None` if it does not exist.
    async fn update_user(&self, user: &User) -> StoreResult<Option<User>>;
    async fn delete_user(&self, id: i64) -> StoreResult<bool>;
    async fn count_users(&self) -> StoreResult<i64>;
    async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn recommendations(&self) -> StoreResult<Vec<Recommendation>>;
}

#[async_trait]
pub trait Store: MoodStore + UserStore + CatalogStore {
    async fn ping(&self) -> StoreResult<()>;
}

/// Where a read was served from. Serialized with the labels the admin UI shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataSource {
    #[serde(rename = "PostgreSQL")]
    Database,
    #[serde(rename = "Static Data (Database Unavailable)")]
    StaticUnavailable,
    #[serde(rename = "Static Data (Database Not Configured)")]
    StaticNotConfigured,
}

/// Errors meaning the database could not be reached. Anything else is a real
/// answer from a live database and must reach the caller.
pub fn is_outage(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
    )
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Debug)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

#[derive(Clone)]
pub struct Repository {
    primary: Option<Arc<dyn Store>>,
    fallback: Arc<dyn Store>,
    timeout: Duration,
    configured: bool,
}

impl Repository {
    /// `configured` records whether a database URL was supplied at all, so a
    /// failed startup connection reports "unavailable" rather than "not configured".
    pub fn new(
        primary: Option<Arc<dyn Store>>,
        fallback: Arc<dyn Store>,
        timeout: Duration,
        configured: bool,
    ) -> Self {
        let configured = configured || primary.is_some();
        Self {
            primary,
            fallback,
            timeout,
            configured,
        }
    }

    /// Repository that only ever serves the given in-memory store.
    pub fn static_only(fallback: Arc<dyn Store>) -> Self {
        Self::new(None, fallback, Duration::from_secs(1), false)
    }

    async fn run<'a, T, F, Fut>(&'a self, op: &'static str, f: F) -> StoreResult<Sourced<T>>
    where
        F: Fn(&'a dyn Store) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let source = match &self.primary {
            Some(primary) => {
                match tokio::time::timeout(self.timeout, f(&**primary)).await {
                    Ok(Ok(value)) => {
                        return Ok(Sourced {
                            value,
                            source: DataSource::Database,
                        })
                    }
                    Ok(Err(e)) if is_outage(&e) => {
                        tracing::warn!(op, error = %e, "Database call failed, serving static data");
                    }
                    Ok(Err(e)) => return Err(e),
                    Err(_) => {
                        tracing::warn!(
                            op,
                            timeout_ms = self.timeout.as_millis() as u64,
                            "Database call timed out, serving static data"
                        );
                    }
                }
                DataSource::StaticUnavailable
            }
            None if self.configured => DataSource::StaticUnavailable,
            None => DataSource::StaticNotConfigured,
        };

        let value = f(&*self.fallback).await?;
        Ok(Sourced { value, source })
    }

    pub fn database_configured(&self) -> bool {
        self.configured
    }

    /// True only when the database answers a ping within the timeout.
    pub async fn database_reachable(&self) -> bool {
        let Some(primary) = &self.primary else {
            return false;
        };
        matches!(
            tokio::time::timeout(self.timeout, primary.ping()).await,
            Ok(Ok(()))
        )
    }

    pub async fn moods_for_user(&self, user_id: i64) -> StoreResult<Sourced<Vec<MoodEntry>>> {
        self.run("moods_for_user", |s| s.moods_for_user(user_id)).await
    }

    pub async fn all_moods(&self) -> StoreResult<Sourced<Vec<MoodEntry>>> {
        self.run("all_moods", |s| s.all_moods()).await
    }

    pub async fn find_mood(&self, id: i64) -> StoreResult<Option<MoodEntry>> {
        Ok(self.run("find_mood", |s| s.find_mood(id)).await?.value)
    }

    pub async fn record_mood(&self, entry: NewMoodEntry) -> StoreResult<Sourced<MoodEntry>> {
        self.run("record_mood", |s| s.record_mood(entry.clone())).await
    }

    pub async fn recommendations(&self) -> StoreResult<Sourced<Vec<Recommendation>>> {
        self.run("recommendations", |s| s.recommendations()).await
    }

    pub async fn users(&self) -> StoreResult<Sourced<Vec<User>>> {
        self.run("users", |s| s.users()).await
    }

    pub async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.run("find_user", |s| s.find_user(id)).await?.value)
    }

    pub async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .run("find_user_by_username", |s| s.find_user_by_username(username))
            .await?
            .value)
    }

    pub async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        Ok(self
            .run("create_user", |s| s.create_user(user.clone()))
            .await?
            .value)
    }

    pub async fn update_user(&self, user: &User) -> StoreResult<Option<User>> {
        Ok(self.run("update_user", |s| s.update_user(user)).await?.value)
    }

    pub async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        Ok(self.run("delete_user", |s| s.delete_user(id)).await?.value)
    }

    pub async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.run("count_users", |s| s.count_users()).await?.value)
    }

    pub async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        Ok(self.run("touch_login", |s| s.touch_login(id, at)).await?.value)
    }
}
