use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use magpie_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// The resolved principal, attached to the request after authentication.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
}

/// Identity resolver: an `api-key` header wins; otherwise the
/// Authorization header must carry a bearer token whose `sub` claim names
/// a known user. A resolved but suspended account is rejected separately
/// as `InactiveUser`. Pure lookups, no mutation.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = req
        .headers()
        .get("api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let user = if let Some(key) = api_key {
        let db = state.db.clone();
        tokio::task::spawn_blocking(move || db.get_user_by_api_key(&key))
            .await??
            .ok_or(ApiError::Unauthorized)?
    } else {
        let auth_header = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| ApiError::Unauthorized)?;

        let username = token_data.claims.sub;
        let db = state.db.clone();
        tokio::task::spawn_blocking(move || db.get_user_by_name(&username))
            .await??
            .ok_or(ApiError::Unauthorized)?
    };

    if !user.active {
        return Err(ApiError::InactiveUser);
    }

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        name: user.name,
    });
    Ok(next.run(req).await)
}
