use std::sync::Arc;

use crate::config::{AppConfig, DatabaseConfig, JwtConfig};
use crate::db::{self, Store};
use crate::memory::MemoryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await?;
        tracing::info!("database ready");

        Ok(Self::from_parts(Arc::new(pool), Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Empty in-memory store with a fixed signing secret.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database: DatabaseConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                name: None,
                user: None,
                password: None,
                max_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: 60,
            },
        });

        let store = Arc::new(MemoryStore::new()) as Arc<dyn Store>;
        Self::from_parts(store, config)
    }
}
