use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CredentialStore, InterestStore, MatchCandidate, NewUser, ProfileUpdate, StoreError, User,
};

/// Process-local store. One lock guards all maps, so every write is atomic
/// with respect to every read.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    by_username: HashMap<String, Uuid>,
    interests: HashMap<Uuid, BTreeSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops a user and, like the FK cascade in Postgres, their interests.
    #[cfg(test)]
    pub async fn remove_user(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.remove(&id) else {
            return false;
        };
        inner.by_email.remove(&user.email);
        if let Some(name) = &user.username {
            inner.by_username.remove(name);
        }
        inner.interests.remove(&id);
        true
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, new: NewUser<'_>) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_email.contains_key(new.email) {
            return Err(StoreError::DuplicateEmail);
        }
        if let Some(name) = new.username {
            if inner.by_username.contains_key(name) {
                return Err(StoreError::DuplicateUsername);
            }
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            username: new.username.map(str::to_string),
            contact: None,
            password_hash: new.password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.by_email.insert(user.email.clone(), user.id);
        if let Some(name) = &user.username {
            inner.by_username.insert(name.clone(), user.id);
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_email
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.users.contains_key(&id))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(current) = inner.users.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(name) = &update.username {
            match inner.by_username.get(name) {
                Some(owner) if *owner != id => return Err(StoreError::DuplicateUsername),
                _ => {}
            }
        }

        let mut user = current;
        if let Some(name) = update.username {
            if let Some(old) = user.username.take() {
                inner.by_username.remove(&old);
            }
            inner.by_username.insert(name.clone(), id);
            user.username = Some(name);
        }
        if let Some(contact) = update.contact {
            user.contact = Some(contact);
        }
        inner.users.insert(id, user.clone());
        Ok(Some(user))
    }
}

#[async_trait]
impl InterestStore for MemoryStore {
    async fn read_tags(&self, user_id: Uuid) -> Result<BTreeSet<String>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .interests
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_tags(&self, user_id: Uuid, tags: &BTreeSet<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Err(StoreError::UnknownUser);
        }
        if tags.is_empty() {
            inner.interests.remove(&user_id);
        } else {
            inner.interests.insert(user_id, tags.clone());
        }
        Ok(())
    }

    async fn match_candidates(
        &self,
        requester: Uuid,
        tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        let inner = self.inner.read().await;
        let mut out: Vec<MatchCandidate> = inner
            .interests
            .iter()
            .filter(|(id, _)| **id != requester)
            .filter_map(|(id, theirs)| {
                let common: Vec<String> = tags.intersection(theirs).cloned().collect();
                if common.is_empty() {
                    return None;
                }
                let user = inner.users.get(id)?;
                Some(MatchCandidate {
                    user_id: *id,
                    username: user.username.clone(),
                    contact: user.contact.clone(),
                    common,
                })
            })
            .collect();
        out.sort_by(|a, b| a.rank_cmp(b));
        out.truncate(limit);
        Ok(out)
    }
}
