use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MatchQuery, MatchResult},
    services::{clamp_limit, find_matches},
};
use crate::{auth::AuthUser, error::AppResult, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/matches", get(list_matches))
}

/// GET /matches?limit=N
#[instrument(skip(state, query))]
pub async fn list_matches(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<MatchQuery>, QueryRejection>,
) -> AppResult<Json<Vec<MatchResult>>> {
    let Query(query) = query?;
    let limit = clamp_limit(query.limit);
    let found = find_matches(state.store.as_ref(), user_id, limit).await?;
    Ok(Json(found))
}
