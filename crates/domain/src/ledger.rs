//! Balance top-ups and balance reads.

use common::{Money, UserId};
use market_store::{LedgerStore, Store, UnitOfWork};
use tracing::info;

use crate::commands::TopUpBalance;
use crate::deadline::Deadline;
use crate::error::DomainError;

/// Service for the user balance ledger outside of purchases.
#[derive(Clone)]
pub struct LedgerService<S: Store> {
    store: S,
}

impl<S: Store> LedgerService<S> {
    /// Creates a new ledger service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Adds a positive amount to a user's balance and returns the new balance.
    ///
    /// The user row is locked for the read-modify-write, so a concurrent
    /// purchase touching the same user is serialized against it.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn top_up(&self, cmd: TopUpBalance, deadline: Deadline) -> Result<Money, DomainError> {
        if !cmd.amount.is_positive() {
            return Err(DomainError::InvalidArgument(format!(
                "top-up amount must be greater than 0, got {}",
                cmd.amount
            )));
        }

        let (tx, balance) = deadline
            .run(async {
                let mut tx = self.store.begin().await?;

                let user = tx.lock_user(cmd.user_id).await?;
                let balance = user.balance.checked_add(cmd.amount).ok_or_else(|| {
                    DomainError::InvalidArgument("balance overflow".to_string())
                })?;
                tx.set_balance(user.id, balance).await?;
                Ok::<_, DomainError>((tx, balance))
            })
            .await?;
        tx.commit().await?;

        metrics::counter!("marketplace_top_ups_total").increment(1);
        info!(user_id = %cmd.user_id, amount = %cmd.amount, balance = %balance, "Balance topped up");
        Ok(balance)
    }

    /// Returns a user's current balance.
    #[tracing::instrument(skip(self))]
    pub async fn get_balance(&self, user_id: UserId) -> Result<Money, DomainError> {
        let mut tx = self.store.begin().await?;
        let balance = tx.get_balance(user_id).await?;
        tx.rollback().await?;
        Ok(balance)
    }
}
