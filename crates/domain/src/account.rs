//! User record creation.

use common::UserId;
use market_store::{LedgerStore, Store, UnitOfWork, User};
use tracing::info;

use crate::commands::RegisterUser;
use crate::deadline::Deadline;
use crate::error::DomainError;

/// Service that creates and reads user records.
#[derive(Clone)]
pub struct AccountService<S: Store> {
    store: S,
}

impl<S: Store> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a user with a zero balance.
    #[tracing::instrument(skip(self, deadline))]
    pub async fn register(&self, cmd: RegisterUser, deadline: Deadline) -> Result<User, DomainError> {
        if cmd.name.trim().is_empty() {
            return Err(DomainError::InvalidArgument(
                "user name must not be empty".to_string(),
            ));
        }
        if cmd.credential.is_empty() {
            return Err(DomainError::InvalidArgument(
                "credential must not be empty".to_string(),
            ));
        }

        let (tx, user) = deadline
            .run(async {
                let mut tx = self.store.begin().await?;
                let user = tx.insert_user(&cmd.name, &cmd.credential).await?;
                Ok::<_, DomainError>((tx, user))
            })
            .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Loads a user record.
    #[tracing::instrument(skip(self))]
    pub async fn get_user(&self, user_id: UserId) -> Result<User, DomainError> {
        let mut tx = self.store.begin().await?;
        let user = tx.get_user(user_id).await?;
        tx.rollback().await?;
        Ok(user)
    }
}
