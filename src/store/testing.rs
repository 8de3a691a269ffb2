//! Store doubles for unit tests.

use std::{
    collections::BTreeSet,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use uuid::Uuid;

use super::{
    memory::MemoryStore, CredentialStore, InterestStore, MatchCandidate, NewUser, ProfileUpdate,
    StoreError, User,
};

fn outage() -> StoreError {
    StoreError::Unavailable(sqlx::Error::PoolTimedOut)
}

/// Every call fails as if the pool could not hand out a connection.
pub struct UnavailableStore;

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn insert_user(&self, _new: NewUser<'_>) -> Result<User, StoreError> {
        Err(outage())
    }
    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
        Err(outage())
    }
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, StoreError> {
        Err(outage())
    }
    async fn exists_by_id(&self, _id: Uuid) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn update_profile(&self, _id: Uuid, _u: ProfileUpdate) -> Result<Option<User>, StoreError> {
        Err(outage())
    }
}

#[async_trait]
impl InterestStore for UnavailableStore {
    async fn read_tags(&self, _user_id: Uuid) -> Result<BTreeSet<String>, StoreError> {
        Err(outage())
    }
    async fn replace_tags(&self, _user_id: Uuid, _tags: &BTreeSet<String>) -> Result<(), StoreError> {
        Err(outage())
    }
    async fn match_candidates(
        &self,
        _requester: Uuid,
        _tags: &BTreeSet<String>,
        _limit: usize,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        Err(outage())
    }
}

/// Memory store that counts candidate queries.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub candidate_queries: AtomicUsize,
}

impl CountingStore {
    pub fn candidate_queries(&self) -> usize {
        self.candidate_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InterestStore for CountingStore {
    async fn read_tags(&self, user_id: Uuid) -> Result<BTreeSet<String>, StoreError> {
        self.inner.read_tags(user_id).await
    }
    async fn replace_tags(&self, user_id: Uuid, tags: &BTreeSet<String>) -> Result<(), StoreError> {
        self.inner.replace_tags(user_id, tags).await
    }
    async fn match_candidates(
        &self,
        requester: Uuid,
        tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        self.candidate_queries.fetch_add(1, Ordering::SeqCst);
        self.inner.match_candidates(requester, tags, limit).await
    }
}
