use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse},
        jwt::JwtKeys,
        services,
    },
    error::AppResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/users/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let token = services::login(
        state.users.as_ref(),
        &keys,
        &payload.email,
        &payload.password,
    )
    .await?;
    Ok(Json(LoginResponse { token }))
}
