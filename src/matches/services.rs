//! Ranking other users by how many interest tags they share with the
//! requester.

use tracing::debug;
use uuid::Uuid;

use super::dto::MatchResult;
use crate::{error::AppResult, store::InterestStore};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Missing means default; anything else is clamped into `1..=MAX_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> usize {
    match requested {
        None => DEFAULT_LIMIT,
        Some(n) => n.clamp(1, MAX_LIMIT as i64) as usize,
    }
}

pub async fn find_matches<S>(store: &S, user_id: Uuid, limit: usize) -> AppResult<Vec<MatchResult>>
where
    S: InterestStore + ?Sized,
{
    let mine = store.read_tags(user_id).await?;
    if mine.is_empty() {
        debug!(%user_id, "no interests saved, no matches");
        return Ok(Vec::new());
    }

    let limit = limit.clamp(1, MAX_LIMIT);
    let mut candidates = store.match_candidates(user_id, &mine, limit).await?;

    // The store already filters and orders; re-establish the guarantees
    // here so every backend yields identical output.
    candidates.retain(|c| c.user_id != user_id);
    for c in &mut candidates {
        c.common.retain(|t| mine.contains(t));
        c.common.sort();
        c.common.dedup();
    }
    candidates.retain(|c| !c.common.is_empty());
    candidates.sort_by(|a, b| a.rank_cmp(b));
    candidates.truncate(limit);

    debug!(%user_id, found = candidates.len(), "matches ranked");
    Ok(candidates.into_iter().map(MatchResult::from).collect())
}
