use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::store::{MarketStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MarketStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;
                Arc::new(PgStore::connect(url, config.max_connections).await?)
                    as Arc<dyn MarketStore>
            }
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new()) as Arc<dyn MarketStore>
            }
        };

        Ok(Self { store, config })
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::config::{EligibilityRules, JwtConfig};

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            eligibility: EligibilityRules::default(),
            host: "127.0.0.1".into(),
            port: 0,
        });

        Self {
            store: Arc::new(MemoryStore::new()),
            config,
        }
    }
}
