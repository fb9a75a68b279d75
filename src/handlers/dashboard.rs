use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::AppResult;
use crate::services::metrics::{dashboard_stats, DashboardInputs, DashboardStats};
use crate::AppState;

pub async fn stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    let repo = &state.repo;

    let user_count = repo.count_users().await?;
    let users = repo.users().await?;
    let moods = repo.all_moods().await?;
    let catalog = repo.recommendations().await?;
    let database_connected = repo.database_reachable().await;

    let stats = dashboard_stats(
        DashboardInputs {
            user_count,
            users: &users.value,
            moods: &moods.value,
            recommendation_count: catalog.value.len(),
            database_connected,
            data_source: moods.source,
        },
        Utc::now(),
    );

    Ok(Json(stats))
}
