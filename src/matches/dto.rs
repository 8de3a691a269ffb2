use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::store::MatchCandidate;

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    #[serde(default, deserialize_with = "lenient_limit")]
    pub limit: Option<i64>,
}

/// Empty means absent. Integers outside `i64` saturate so the caller's
/// clamp still applies; anything non-numeric is rejected.
fn lenient_limit<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(Some(n));
    }
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Some(if negative { i64::MIN } else { i64::MAX }));
    }
    Err(de::Error::custom(format!("limit must be an integer, got {raw:?}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub contact: Option<String>,
    pub overlap: usize,
    /// Shared tags, alphabetical.
    pub common: Vec<String>,
}

impl From<MatchCandidate> for MatchResult {
    fn from(c: MatchCandidate) -> Self {
        Self {
            overlap: c.overlap(),
            user_id: c.user_id,
            username: c.username,
            contact: c.contact,
            common: c.common,
        }
    }
}

