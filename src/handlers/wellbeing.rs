use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

use crate::error::AppResult;
use crate::models::mood::{MoodEntry, NewMoodEntry, RecordMoodRequest, WellbeingMetrics, DEFAULT_USER_ID};
use crate::models::recommendation::Recommendation;
use crate::services::metrics::{global_metrics, wellbeing_metrics, GlobalMetrics};
use crate::services::recommendations::personalize;
use crate::AppState;

pub async fn get_wellbeing(State(state): State<AppState>) -> AppResult<Json<WellbeingMetrics>> {
    let moods = state.repo.moods_for_user(DEFAULT_USER_ID).await?;
    Ok(Json(wellbeing_metrics(&moods.value)))
}

pub async fn get_metrics(State(state): State<AppState>) -> AppResult<Json<GlobalMetrics>> {
    let moods = state.repo.all_moods().await?;
    Ok(Json(global_metrics(&moods.value, moods.source, Utc::now())))
}

pub async fn record_mood(
    State(state): State<AppState>,
    Json(body): Json<RecordMoodRequest>,
) -> AppResult<(StatusCode, Json<MoodEntry>)> {
    let entry = NewMoodEntry::new(
        body.user_id.unwrap_or(DEFAULT_USER_ID),
        body.score,
        body.notes,
        body.recorded_at.unwrap_or_else(Utc::now),
    );

    let stored = state.repo.record_mood(entry).await?;
    tracing::info!(
        mood_id = stored.value.id,
        user_id = stored.value.user_id,
        score = stored.value.score,
        source = ?stored.source,
        "Mood recorded"
    );

    Ok((StatusCode::CREATED, Json(stored.value)))
}

pub async fn mood_history(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let moods = state.repo.moods_for_user(user_id).await?;
    Ok(Json(moods.value))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationQuery {
    pub user_id: Option<i64>,
}

pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let user_id = query.user_id.unwrap_or(DEFAULT_USER_ID);
    let catalog = state.repo.recommendations().await?.value;

    let history = match state.repo.moods_for_user(user_id).await {
        Ok(moods) => moods.value,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Mood history unavailable, returning full catalog");
            return Ok(Json(catalog));
        }
    };

    let mut rng = StdRng::from_entropy();
    Ok(Json(personalize(&history, &catalog, &mut rng)))
}

pub async fn catalog(State(state): State<AppState>) -> AppResult<Json<Vec<Recommendation>>> {
    Ok(Json(state.repo.recommendations().await?.value))
}
