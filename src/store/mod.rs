//! Persistence boundary for credentials and interest sets.
//!
//! Two backends implement the same contract: [`postgres::PgStore`] for
//! deployments and [`memory::MemoryStore`] for local runs and tests.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
#[cfg(test)]
pub mod testing;
mod types;

pub use types::{MatchCandidate, NewUser, ProfileUpdate, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("username already taken")]
    DuplicateUsername,

    /// The referenced user row does not exist (anymore).
    #[error("unknown user")]
    UnknownUser,

    #[error(transparent)]
    Unavailable(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user; uniqueness is enforced by the store itself.
    async fn insert_user(&self, new: NewUser<'_>) -> Result<User, StoreError>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Returns `None` when the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait InterestStore: Send + Sync {
    /// Empty set for a user that never saved interests.
    async fn read_tags(&self, user_id: Uuid) -> Result<BTreeSet<String>, StoreError>;

    /// Replaces the whole set in one atomic step. Readers observe either the
    /// old or the new set, never a mix.
    async fn replace_tags(&self, user_id: Uuid, tags: &BTreeSet<String>) -> Result<(), StoreError>;

    /// Users other than `requester` sharing at least one of `tags`, ranked by
    /// overlap desc, username asc (missing last), id asc, and cut to `limit`.
    async fn match_candidates(
        &self,
        requester: Uuid,
        tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, StoreError>;
}

pub trait Store: CredentialStore + InterestStore {}

impl<T: CredentialStore + InterestStore> Store for T {}
