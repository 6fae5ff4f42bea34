use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    geo::{
        dto::{DeleteManyRequest, DeleteManyResponse, MessageResponse},
        repo_types::SearchHistoryEntry,
        services,
    },
    state::AppState,
};

pub fn geo_routes() -> Router<AppState> {
    Router::new()
        .route("/geo/history", get(list_history))
        .route("/geo/history/delete-multiple", post(delete_multiple))
        .route("/geo/history/:id", delete(delete_history))
        .route("/geo/:ip", get(lookup_ip))
}

#[instrument(skip(state))]
pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<Vec<SearchHistoryEntry>>> {
    let entries = services::list(state.history.as_ref(), user_id).await?;
    Ok(Json(entries))
}

#[instrument(skip(state))]
pub async fn lookup_ip(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(ip): Path<String>,
) -> AppResult<Json<SearchHistoryEntry>> {
    let entry = services::lookup(state.geo.as_ref(), state.history.as_ref(), user_id, &ip).await?;
    Ok(Json(entry))
}

#[instrument(skip(state, payload))]
pub async fn delete_multiple(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<DeleteManyRequest>, JsonRejection>,
) -> AppResult<Json<DeleteManyResponse>> {
    let Json(payload) = payload?;
    let deleted = services::delete_many(state.history.as_ref(), user_id, payload.ids).await?;
    Ok(Json(DeleteManyResponse {
        message: "Selected histories deleted successfully".into(),
        deleted,
    }))
}

#[instrument(skip(state))]
pub async fn delete_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_one(state.history.as_ref(), user_id, &id).await?;
    Ok(Json(MessageResponse {
        message: "History deleted successfully".into(),
    }))
}
