pub mod auth;
pub mod error;
pub mod media;
pub mod middleware;
pub mod service;
pub mod state;
pub mod tweets;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::require_auth;
use crate::state::AppState;

/// Assemble the HTTP surface. Everything except `/token` sits behind the
/// identity-resolver middleware.
pub fn router(state: AppState) -> Router {
    // Leave headroom for multipart framing on top of the file itself.
    let body_limit = state.config.max_file_bytes + 64 * 1024;

    let public = Router::new()
        .route("/token", post(auth::issue_token))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/tweets", post(tweets::create_tweet).get(tweets::get_tweets))
        .route(
            "/tweets/{tweet_id}",
            get(tweets::get_tweet).delete(tweets::remove_tweet),
        )
        .route(
            "/tweets/{tweet_id}/likes",
            post(tweets::create_like).delete(tweets::remove_like),
        )
        .route("/medias", post(media::add_media))
        .route("/users", get(users::get_users))
        .route("/users/me", get(users::me))
        .route("/users/{user_id}", get(users::get_user))
        .route(
            "/users/{user_id}/follow",
            post(users::add_follow).delete(users::remove_follow),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}
