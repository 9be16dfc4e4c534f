//! Transaction core of the marketplace.
//!
//! This crate provides:
//! - the item lifecycle state machine and its guards
//! - listing, purchase, top-up and registration orchestration, each run as
//!   one unit of work against a [`market_store::Store`]
//! - read accessors over the catalog
//! - caller-supplied deadlines that roll back uncommitted work

pub mod account;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod deadline;
pub mod error;
pub mod item;
pub mod ledger;
pub mod listing;
pub mod marketplace;
pub mod purchase;

pub use account::AccountService;
pub use catalog::CatalogService;
pub use commands::{ListItem, PurchaseItem, RegisterUser, SellItem, TopUpBalance};
pub use common::{CategoryId, ItemId, ItemStatus, Money, UserId};
pub use config::MarketConfig;
pub use deadline::Deadline;
pub use error::{DomainError, ErrorKind, Precondition};
pub use item::{ItemError, ItemLifecycle};
pub use ledger::LedgerService;
pub use listing::ListingService;
pub use marketplace::Marketplace;
pub use purchase::{PurchaseReceipt, PurchaseService};
