use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub contact: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never leaves the server
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: Option<&'a str>,
    pub password_hash: &'a str,
}

/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub contact: Option<String>,
}

/// One other user sharing tags with the requester.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MatchCandidate {
    pub user_id: Uuid,
    pub username: Option<String>,
    pub contact: Option<String>,
    /// Shared tags, each once.
    pub common: Vec<String>,
}

impl MatchCandidate {
    pub fn overlap(&self) -> usize {
        self.common.len()
    }

    /// Total order used for ranking: overlap desc, then username ascending
    /// with unnamed users last, then id ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .overlap()
            .cmp(&self.overlap())
            .then_with(|| match (&self.username, &other.username) {
                (Some(a), Some(b)) => a.as_bytes().cmp(b.as_bytes()),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| self.user_id.cmp(&other.user_id))
    }
}
