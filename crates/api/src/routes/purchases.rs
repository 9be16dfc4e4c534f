//! Purchase endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ItemId;
use domain::{PurchaseItem, PurchaseReceipt};
use market_store::Store;

use crate::AppState;
use crate::error::ApiError;
use crate::routes::auth::ActingUser;

/// POST /purchase/{id} — buy an item on sale as the acting user.
#[tracing::instrument(skip(state))]
pub async fn purchase<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ActingUser(buyer): ActingUser,
    Path(id): Path<i64>,
) -> Result<Json<PurchaseReceipt>, ApiError> {
    let receipt = state
        .market
        .purchases
        .purchase(
            PurchaseItem::new(buyer, ItemId::new(id)),
            state.market.deadline(),
        )
        .await?;
    Ok(Json(receipt))
}
