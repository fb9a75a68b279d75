use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::models::user::{LoginRequest, NewUser, RegisterRequest, Role, User};
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let body = body.trimmed();
    body.validate()?;

    if state.repo.find_user_by_username(&body.username).await?.is_some() {
        tracing::warn!(username = %body.username, "Registration failed: username already exists");
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let now = Utc::now();
    let user = state
        .repo
        .create_user(NewUser {
            name: body.name,
            email: body.email,
            username: body.username,
            password_hash: hash_password(&body.password)?,
            department: body.department.unwrap_or_else(|| "General".to_string()),
            team_id: None,
            is_admin: false,
            role: Role::Employee,
            join_date: now,
            last_login_at: now,
        })
        .await
        .map_err(AppError::from_insert)?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<User>> {
    let Some(mut user) = state.repo.find_user_by_username(body.username.trim()).await? else {
        tracing::warn!(username = %body.username, "Failed login attempt");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&body.password, &user.password_hash)? {
        tracing::warn!(username = %body.username, "Failed login attempt");
        return Err(AppError::InvalidCredentials);
    }

    let now = Utc::now();
    state.repo.touch_login(user.id, now).await?;
    user.last_login_at = now;

    tracing::info!(user_id = user.id, "Successful login");
    Ok(Json(user))
}
