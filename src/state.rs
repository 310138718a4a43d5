use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    blog::Orchestrator,
    config::AppConfig,
    provider::{OpenAiProvider, PlaceholderProvider, TextGenerator},
    store::{MemoryStore, PgStore, Store},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub generator: Orchestrator,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url).await?;
                pg.migrate().await?;
                info!("connected to postgres");
                Arc::new(pg)
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory store, nothing will be persisted");
                Arc::new(MemoryStore::new())
            }
        };

        let provider: Arc<dyn TextGenerator> = match &config.provider.api_key {
            Some(key) => Arc::new(OpenAiProvider::new(&config.provider, key.clone())?),
            None => {
                warn!("OPENAI_API_KEY not set; generating placeholder articles");
                Arc::new(PlaceholderProvider::new())
            }
        };
        info!(provider = provider.name(), model = %config.provider.model, "text generator ready");

        Ok(Self::from_parts(config, store, provider))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn Store>,
        provider: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            generator: Orchestrator::new(provider, store.clone()),
            config,
            store,
        }
    }

    /// In-memory store and placeholder provider, no I/O.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryStore::new()),
            Arc::new(PlaceholderProvider::new()),
        )
    }
}
