use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{InterestsResponse, PutInterestsRequest, SavedResponse},
    services,
};
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/interests", get(get_interests).put(put_interests))
}

#[instrument(skip(state))]
pub async fn get_interests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<InterestsResponse>> {
    let tags = services::get(state.store.as_ref(), user_id).await?;
    Ok(Json(InterestsResponse {
        interests: tags.into_iter().collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn put_interests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<PutInterestsRequest>, JsonRejection>,
) -> AppResult<Json<SavedResponse>> {
    let Json(payload) = payload?;
    let saved = services::replace(state.store.as_ref(), user_id, &payload.interests).await?;
    Ok(Json(SavedResponse { saved: saved.len() }))
}
