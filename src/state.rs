use crate::config::{ServerConfig, StoreBackend};
use crate::lifecycle::AdoptionService;
use crate::store::{MemoryStore, Repositories, SupabaseConfig, SupabaseStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Shared per-process handles. Holds no entity data of its own; every
/// request reads and writes through the repositories.
pub struct AppState {
    config: Arc<ServerConfig>,
    repos: Repositories,
    adoptions: AdoptionService,
}

impl AppState {
    pub fn new(config: Arc<ServerConfig>, repos: Repositories) -> Self {
        let adoptions = AdoptionService::new(
            repos.pets.clone(),
            repos.applications.clone(),
            config.sync_pet_status,
        );
        Self {
            config,
            repos,
            adoptions,
        }
    }

    /// Connects the configured store backend.
    pub fn from_config(config: Arc<ServerConfig>) -> Result<Self> {
        let repos = match config.store {
            StoreBackend::Memory => Repositories::from_backend(Arc::new(MemoryStore::new())),
            StoreBackend::Supabase => {
                let store = SupabaseStore::new(SupabaseConfig {
                    url: config
                        .store_url
                        .clone()
                        .context("store url is not configured")?,
                    api_key: config
                        .store_api_key
                        .clone()
                        .context("store api key is not configured")?,
                    timeout: config.store_timeout,
                })
                .context("failed to create store client")?;
                Repositories::from_backend(Arc::new(store))
            }
        };
        info!(
            backend = repos.health.backend(),
            sync_pet_status = config.sync_pet_status,
            "entity store configured"
        );
        Ok(Self::new(config, repos))
    }

    pub fn config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn adoptions(&self) -> &AdoptionService {
        &self.adoptions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_builds_without_credentials() {
        let state = AppState::from_config(Arc::new(ServerConfig::default())).unwrap();
        assert_eq!(state.repos().health.backend(), "memory");
    }

    #[test]
    fn supabase_backend_needs_url() {
        let config = ServerConfig {
            store: StoreBackend::Supabase,
            ..ServerConfig::default()
        };
        assert!(AppState::from_config(Arc::new(config)).is_err());
    }
}
