//! Application state.

use std::sync::Arc;

use perk_ledger::{
    PasswordHasher, ProfileAggregator, Provisioning, PurchaseEngine, TransferEngine,
};
use perk_store::Store;

use crate::auth::TokenProvider;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
pub struct AppState {
    /// Account provisioning and credential checks.
    pub provisioning: Provisioning,

    /// Point transfers between employees.
    pub transfers: TransferEngine,

    /// Merch purchases.
    pub purchases: PurchaseEngine,

    /// Aggregated account info.
    pub profiles: ProfileAggregator,

    /// Session token issue/verify.
    pub tokens: TokenProvider,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create the application state from its dependencies.
    ///
    /// The store handle is passed in explicitly so tests can wire up the
    /// in-memory backend.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        hasher: Arc<dyn PasswordHasher>,
        config: ServiceConfig,
    ) -> Self {
        let tokens = TokenProvider::new(&config.jwt_secret, config.token_lifetime_hours);

        Self {
            provisioning: Provisioning::new(Arc::clone(&store), hasher),
            transfers: TransferEngine::new(Arc::clone(&store)),
            purchases: PurchaseEngine::new(Arc::clone(&store)),
            profiles: ProfileAggregator::new(store),
            tokens,
            config,
        }
    }
}
