//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use kindred_auth::DeviceSessionStore;
use kindred_cache::provider::CacheManager;
use kindred_core::config::AppConfig;
use kindred_core::traits::cache::CacheProvider;
use kindred_core::traits::clock::Clock;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// Per-user device session registry
    pub device_store: Arc<DeviceSessionStore>,
}

impl AppState {
    /// Wires the device store on top of `cache`.
    pub fn new(config: AppConfig, cache: CacheManager, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(cache);
        let device_store = DeviceSessionStore::new(
            Arc::clone(&cache) as Arc<dyn CacheProvider>,
            clock,
            config.devices.clone(),
        );
        Self {
            config: Arc::new(config),
            cache,
            device_store: Arc::new(device_store),
        }
    }
}
