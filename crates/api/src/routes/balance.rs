//! Balance endpoints for the acting user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::Money;
use domain::TopUpBalance;
use market_store::Store;
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::auth::ActingUser;

#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    /// Amount to add.
    pub balance: i64,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub balance: Money,
}

/// GET /balance
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ActingUser(user): ActingUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.market.ledger.get_balance(user).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// POST /balance — add funds and return the new balance.
#[tracing::instrument(skip(state))]
pub async fn top_up<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ActingUser(user): ActingUser,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .market
        .ledger
        .top_up(
            TopUpBalance::new(user, Money::new(req.balance)),
            state.market.deadline(),
        )
        .await?;
    Ok(Json(BalanceResponse { balance }))
}
