use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::models::user::{CreateUserRequest, NewUser, Role, UpdateUserRequest, User, UserList};
use crate::AppState;

const DEFAULT_NAME: &str = "New User";
const DEFAULT_DEPARTMENT: &str = "General";
const DEFAULT_PASSWORD: &str = "Password123";

fn user_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("User with ID {} not found", id))
}

pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<UserList>> {
    let users = state.repo.users().await?;
    Ok(Json(UserList {
        users: users.value,
        data_source: users.source,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    let user = state.repo.find_user(id).await?.ok_or_else(|| user_not_found(id))?;
    Ok(Json(user))
}

pub async fn count_users(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let count = state.repo.count_users().await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    let body = body.trimmed();
    body.validate()?;

    let name = body.name.unwrap_or_else(|| DEFAULT_NAME.to_string());
    let username = body
        .username
        .unwrap_or_else(|| name.to_lowercase().replace(' ', "."));
    let email = body.email.unwrap_or_else(|| format!("{}@company.com", username));
    let department = body.department.unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());
    let password = body.password.unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

    if state.repo.find_user_by_username(&username).await?.is_some() {
        tracing::warn!(username = %username, "Username already exists");
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let now = Utc::now();
    let user = state
        .repo
        .create_user(NewUser {
            name,
            email,
            username,
            password_hash: hash_password(&password)?,
            department,
            team_id: None,
            is_admin: body.is_admin,
            role: Role::for_admin_flag(body.is_admin),
            join_date: now,
            last_login_at: now,
        })
        .await
        .map_err(AppError::from_insert)?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> AppResult<Json<User>> {
    let body = body.trimmed();
    body.validate()?;

    let mut user = state.repo.find_user(id).await?.ok_or_else(|| user_not_found(id))?;

    if let Some(name) = body.name {
        user.name = name;
    }
    if let Some(email) = body.email {
        user.email = email;
    }
    if let Some(department) = body.department {
        user.department = department;
    }
    if let Some(password) = body.password {
        user.password_hash = hash_password(&password)?;
    }
    if let Some(is_admin) = body.is_admin {
        user.is_admin = is_admin;
        user.role = Role::for_admin_flag(is_admin);
    }

    let updated = state
        .repo
        .update_user(&user)
        .await?
        .ok_or_else(|| user_not_found(id))?;

    tracing::info!(user_id = id, "User updated");
    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.repo.delete_user(id).await? {
        return Err(user_not_found(id));
    }

    tracing::info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}
