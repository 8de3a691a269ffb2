use std::{collections::BTreeSet, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{
    CredentialStore, InterestStore, MatchCandidate, NewUser, ProfileUpdate, StoreError, User,
};
use crate::config::DbConfig;

const USER_COLUMNS: &str = "id, email, username, contact, password_hash, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
            .connect(&cfg.url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

/// Maps unique-constraint violations onto the matching identity conflict.
fn map_insert_err(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => return StoreError::DuplicateEmail,
                Some("users_username_key") => return StoreError::DuplicateUsername,
                _ => {}
            }
        }
    }
    StoreError::Unavailable(e)
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn insert_user(&self, new: NewUser<'_>) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.email)
        .bind(new.username)
        .bind(new.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_err)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn exists_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   contact  = COALESCE($3, contact)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.username)
        .bind(update.contact)
        .fetch_optional(&self.db)
        .await
        .map_err(map_insert_err)?;
        Ok(user)
    }
}

#[async_trait]
impl InterestStore for PgStore {
    async fn read_tags(&self, user_id: Uuid) -> Result<BTreeSet<String>, StoreError> {
        let tags: Vec<String> =
            sqlx::query_scalar("SELECT tag FROM user_interests WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.db)
                .await?;
        Ok(tags.into_iter().collect())
    }

    async fn replace_tags(&self, user_id: Uuid, tags: &BTreeSet<String>) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        // Row lock serializes concurrent replaces of the same user; the
        // later one simply wins.
        let owner: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if owner.is_none() {
            return Err(StoreError::UnknownUser);
        }

        sqlx::query("DELETE FROM user_interests WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if !tags.is_empty() {
            let tags: Vec<String> = tags.iter().cloned().collect();
            sqlx::query(
                r#"
                INSERT INTO user_interests (user_id, tag)
                SELECT $1, UNNEST($2::text[])
                "#,
            )
            .bind(user_id)
            .bind(tags)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(%user_id, count = tags.len(), "interest rows replaced");
        Ok(())
    }

    async fn match_candidates(
        &self,
        requester: Uuid,
        tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<MatchCandidate>, StoreError> {
        let tags: Vec<String> = tags.iter().cloned().collect();
        let rows = sqlx::query_as::<_, MatchCandidate>(
            r#"
            SELECT u.id AS user_id,
                   u.username,
                   u.contact,
                   array_agg(ui.tag ORDER BY ui.tag COLLATE "C") AS common
              FROM user_interests ui
              JOIN users u ON u.id = ui.user_id
             WHERE ui.tag = ANY($2::text[])
               AND ui.user_id <> $1
             GROUP BY u.id, u.username, u.contact
             ORDER BY COUNT(*) DESC,
                      u.username COLLATE "C" ASC NULLS LAST,
                      u.id ASC
             LIMIT $3
            "#,
        )
        .bind(requester)
        .bind(tags)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}
