use crate::{
    config::Config,
    credentials::CredentialStore,
    geo::LocationSearch,
    store::{MemoryStore, PostStore},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::sync::Arc;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// Cloned into every handler; everything inside is behind an `Arc`.
///
/// `store` and `search` point at the same storage. Handlers use `store` for
/// CRUD, while `search` only sees its spatial side.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub credentials: Arc<CredentialStore>,
    pub store: Arc<dyn PostStore>,
    pub search: Arc<LocationSearch>,
    pub rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store<S>(config: Config, store: Arc<S>) -> Self
    where
        S: PostStore + 'static,
    {
        let search = LocationSearch::new(store.clone(), config.expansion.clone());
        let rate_limiter = RateLimiter::direct(Quota::per_second(config.rate_limit_per_second));

        Self {
            credentials: Arc::new(CredentialStore::new(config.bcrypt_cost)),
            store,
            search: Arc::new(search),
            rate_limiter: Arc::new(rate_limiter),
            config: Arc::new(config),
        }
    }
}
