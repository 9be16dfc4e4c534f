//! Shared types for the marketplace crates.
//!
//! Identifiers, the money amount used by the ledger, and the item lifecycle
//! state live here so the store and domain layers agree on one definition.

mod money;
mod status;
mod types;

pub use money::Money;
pub use status::{ItemStatus, UnknownStatus};
pub use types::{CategoryId, ItemId, UserId};
