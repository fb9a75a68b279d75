use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

/// Demo deployments track a single employee unless a user id is supplied.
pub const DEFAULT_USER_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: i64,
    pub user_id: i64,
    pub score: i32,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// A mood entry that has not been stored yet. Construct through [`NewMoodEntry::new`]
/// so the score is always within range.
#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub user_id: i64,
    pub score: i32,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl NewMoodEntry {
    pub fn new(
        user_id: i64,
        score: i32,
        notes: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            score: clamp_score(score),
            notes: notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            recorded_at,
        }
    }

    pub fn into_entry(self, id: i64) -> MoodEntry {
        MoodEntry {
            id,
            user_id: self.user_id,
            score: self.score,
            notes: self.notes,
            recorded_at: self.recorded_at,
        }
    }
}

pub fn clamp_score(score: i32) -> i32 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMoodRequest {
    pub user_id: Option<i64>,
    #[serde(alias = "moodScore")]
    pub score: i32,
    pub notes: Option<String>,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodTrend {
    pub date: NaiveDate,
    pub average_mood: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WellbeingMetrics {
    pub average_mood: f64,
    pub mood_entries_count: usize,
    pub mood_trends: Vec<MoodTrend>,
}
