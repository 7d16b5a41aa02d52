//! Shared application state for all routes.

use crate::authz::{AccessPolicy, TenantGate};
use crate::catalog::ResourceCatalog;
use crate::config::TenancyConfig;
use crate::qualifier::{CacheBackend, TenantCache};
use crate::resolver::TenantResolver;
use crate::tenant::TenantDirectory;
use crate::validator::TenantValidator;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TenancyConfig>,
    pub resolver: Arc<TenantResolver>,
    pub validator: TenantValidator,
    pub gate: Arc<TenantGate>,
    pub catalog: Arc<dyn ResourceCatalog>,
    pub directory: Arc<dyn TenantDirectory>,
    pub cache: TenantCache,
}

impl AppState {
    /// Wires the resolver, validator and gate from one configuration. The validator memo is shared.
    pub fn new(
        config: TenancyConfig,
        policy: Arc<dyn AccessPolicy>,
        catalog: Arc<dyn ResourceCatalog>,
        directory: Arc<dyn TenantDirectory>,
        cache_backend: Arc<dyn CacheBackend>,
    ) -> Self {
        let validator = TenantValidator::with_capacity(config.validation_cache_capacity);
        let gate = TenantGate::new(policy).with_unscoped_listings(config.listings_include_unscoped);
        AppState {
            resolver: Arc::new(TenantResolver::new(config.clone(), validator.clone())),
            config: Arc::new(config),
            validator,
            gate: Arc::new(gate),
            catalog,
            directory,
            cache: TenantCache::new(cache_backend),
        }
    }
}
