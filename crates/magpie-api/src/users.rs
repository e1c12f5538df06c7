use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use magpie_types::api::PageQuery;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn get_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.users.clone();
    let users =
        tokio::task::spawn_blocking(move || svc.get_all(query.skip, query.limit)).await??;

    Ok(Json(json!({ "result": true, "users": users })))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.users.clone();
    let user = tokio::task::spawn_blocking(move || svc.get(user_id)).await??;

    Ok(Json(json!({ "result": true, "user": user })))
}

/// GET /users/me — the authenticated principal's own profile, served
/// through the same cache-through path as any other user.
pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.users.clone();
    let detail = tokio::task::spawn_blocking(move || svc.get(user.id)).await??;

    Ok(Json(json!({ "result": true, "user": detail })))
}

pub async fn add_follow(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.users.clone();
    tokio::task::spawn_blocking(move || svc.add_follow(user.id, user_id)).await??;

    Ok((StatusCode::CREATED, Json(json!({ "result": true }))))
}

pub async fn remove_follow(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.users.clone();
    tokio::task::spawn_blocking(move || svc.remove_follow(user.id, user_id)).await??;

    Ok((StatusCode::ACCEPTED, Json(json!({ "result": true }))))
}
