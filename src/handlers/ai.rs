use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::models::analysis::MoodAnalysis;
use crate::services::ai::{check_status, AiStatusSnapshot};
use crate::services::coach::WellbeingCoach;
use crate::services::mood_analysis::MoodAnalyzer;
use crate::AppState;

pub async fn analyze_mood(
    State(state): State<AppState>,
    Path(mood_id): Path<i64>,
) -> AppResult<Json<MoodAnalysis>> {
    let entry = state
        .repo
        .find_mood(mood_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mood entry with ID {} not found", mood_id)))?;

    let analysis = MoodAnalyzer::new(state.ai.clone()).analyze(&entry).await;
    Ok(Json(analysis))
}

pub async fn coach_recommendation(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let history = state.repo.moods_for_user(user_id).await?.value;
    let recommendation = WellbeingCoach::new(state.ai.clone())
        .recommend(&history, Utc::now())
        .await;

    Ok(Json(json!({ "recommendation": recommendation })))
}

pub async fn ai_status(State(state): State<AppState>) -> Json<AiStatusSnapshot> {
    let mut last = state.ai_status.lock().await;
    let snapshot = check_status(
        state.ai.as_deref(),
        last.as_ref(),
        state.config.ai_status_ttl(),
        Utc::now(),
    )
    .await;

    if !snapshot.cached_result {
        *last = Some(snapshot.clone());
    }
    Json(snapshot)
}
