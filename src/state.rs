use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::JwtKeys,
    config::{AppConfig, StoreBackend},
    store::{memory::MemoryStore, postgres::PgStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match (config.backend, &config.db) {
            (StoreBackend::Postgres, Some(db)) => {
                let pg = PgStore::connect(db).await?;
                sqlx::migrate!("./migrations")
                    .run(pg.pool())
                    .await
                    .context("run migrations")?;
                info!(max_connections = db.max_connections, "postgres store ready");
                Arc::new(pg)
            }
            (StoreBackend::Postgres, None) => anyhow::bail!("postgres backend without DATABASE_URL"),
            (StoreBackend::Memory, _) => {
                warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::from_parts(store, config))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        let keys = JwtKeys::from(&config.jwt);
        Self {
            store,
            config,
            keys,
        }
    }

    /// Memory-backed state with a fixed test secret.
    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(Arc::new(MemoryStore::new()))
    }

    #[cfg(test)]
    pub fn fake_with(store: Arc<dyn Store>) -> Self {
        let config = Arc::new(AppConfig {
            backend: StoreBackend::Memory,
            db: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        Self::from_parts(store, config)
    }
}
