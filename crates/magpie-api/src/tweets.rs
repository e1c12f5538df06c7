use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use magpie_types::api::{CreateTweetRequest, PageQuery};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateTweetRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    let tweet_id = tokio::task::spawn_blocking(move || {
        svc.create(user.id, &req.tweet_data, &req.tweet_media_ids)
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "result": true, "tweet_id": tweet_id })),
    ))
}

pub async fn get_tweets(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    let tweets =
        tokio::task::spawn_blocking(move || svc.get_all(query.skip, query.limit)).await??;

    Ok(Json(json!({ "result": true, "tweets": tweets })))
}

pub async fn get_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    let tweet = tokio::task::spawn_blocking(move || svc.get(tweet_id))
        .await??
        .ok_or(ApiError::TweetNotFound)?;

    Ok(Json(json!({ "result": true, "tweet": tweet })))
}

pub async fn remove_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    tokio::task::spawn_blocking(move || svc.remove(tweet_id, &user)).await??;

    Ok((StatusCode::ACCEPTED, Json(json!({ "result": true }))))
}

pub async fn create_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    tokio::task::spawn_blocking(move || svc.create_like(tweet_id, user.id)).await??;

    Ok((StatusCode::CREATED, Json(json!({ "result": true }))))
}

pub async fn remove_like(
    State(state): State<AppState>,
    Path(tweet_id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let svc = state.tweets.clone();
    tokio::task::spawn_blocking(move || svc.remove_like(tweet_id, user.id)).await??;

    Ok((StatusCode::ACCEPTED, Json(json!({ "result": true }))))
}
