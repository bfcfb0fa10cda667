use std::sync::Arc;

use crate::config::AppConfig;
use crate::core::access::{AccessState, MemorySessions};
use crate::core::backend::BackendClient;
use crate::core::wallet::WalletClient;
use crate::core::SessionResolver;
use crate::utils::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub backend: BackendClient,
    pub wallet: WalletClient,
    pub access: AccessState,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self> {
        Self::with_sessions(config, Arc::new(MemorySessions::new()))
    }

    pub fn with_sessions(config: AppConfig, sessions: Arc<dyn SessionResolver>) -> Result<Self> {
        let backend = BackendClient::new(&config)?;
        let wallet = WalletClient::new(backend.clone());
        let access = AccessState {
            policy: Arc::new(config.access_policy()),
            sessions,
        };

        Ok(Self {
            config: Arc::new(config),
            backend,
            wallet,
            access,
        })
    }
}
