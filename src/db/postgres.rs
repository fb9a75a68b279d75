use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CatalogStore, MoodStore, Store, StoreResult, UserStore};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::recommendation::Recommendation;
use crate::models::user::{NewUser, User};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MoodStore for PgStore {
    async fn moods_for_user(&self, user_id: i64) -> StoreResult<Vec<MoodEntry>> {
        sqlx::query_as::<_, MoodEntry>(
            r#"
            SELECT id, user_id, score, notes, recorded_at FROM mood_records
            WHERE user_id = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn all_moods(&self) -> StoreResult<Vec<MoodEntry>> {
        sqlx::query_as::<_, MoodEntry>(
            "SELECT id, user_id, score, notes, recorded_at FROM mood_records ORDER BY recorded_at ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn find_mood(&self, id: i64) -> StoreResult<Option<MoodEntry>> {
        sqlx::query_as::<_, MoodEntry>(
            "SELECT id, user_id, score, notes, recorded_at FROM mood_records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn record_mood(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        sqlx::query_as::<_, MoodEntry>(
            r#"
            INSERT INTO mood_records (user_id, score, notes, recorded_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, score, notes, recorded_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.score)
        .bind(&entry.notes)
        .bind(entry.recorded_at)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn users(&self) -> StoreResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (name, email, username, password_hash, department, team_id, is_admin, role, join_date, last_login_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.department)
        .bind(user.team_id)
        .bind(user.is_admin)
        .bind(user.role)
        .bind(user.join_date)
        .bind(user.last_login_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(&self, user: &User) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                password_hash = $4,
                department = $5,
                team_id = $6,
                is_admin = $7,
                role = $8
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.department)
        .bind(user.team_id)
        .bind(user.is_admin)
        .bind(user.role)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn recommendations(&self) -> StoreResult<Vec<Recommendation>> {
        sqlx::query_as::<_, Recommendation>(
            "SELECT id, title, description, category FROM recommendations ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
    }
}
