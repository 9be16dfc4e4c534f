//! Bundle of every marketplace service over one store.

use market_store::Store;

use crate::account::AccountService;
use crate::catalog::CatalogService;
use crate::config::MarketConfig;
use crate::deadline::Deadline;
use crate::ledger::LedgerService;
use crate::listing::ListingService;
use crate::purchase::PurchaseService;

/// All services sharing one store handle and one configuration.
#[derive(Clone)]
pub struct Marketplace<S: Store> {
    pub listings: ListingService<S>,
    pub purchases: PurchaseService<S>,
    pub ledger: LedgerService<S>,
    pub accounts: AccountService<S>,
    pub catalog: CatalogService<S>,
    config: MarketConfig,
    store: S,
}

impl<S: Store> Marketplace<S> {
    pub fn new(store: S, config: MarketConfig) -> Self {
        Self {
            listings: ListingService::new(store.clone(), &config),
            purchases: PurchaseService::new(store.clone()),
            ledger: LedgerService::new(store.clone()),
            accounts: AccountService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            config,
            store,
        }
    }

    /// Returns the configuration the services were built with.
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Returns the underlying store handle.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Deadline for a request starting now.
    pub fn deadline(&self) -> Deadline {
        self.config.request_deadline()
    }
}
