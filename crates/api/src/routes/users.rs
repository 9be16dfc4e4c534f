//! User registration and per-user listings.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::UserId;
use domain::RegisterUser;
use market_store::{ItemSummary, Store};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    /// Opaque credential produced by the auth layer.
    pub credential: String,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
}

/// POST /users — create a user with a zero balance.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .market
        .accounts
        .register(
            RegisterUser::new(req.name, req.credential),
            state.market.deadline(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            name: user.name,
        }),
    ))
}

/// GET /users/{id}/items — every item a user has listed.
#[tracing::instrument(skip(state))]
pub async fn items<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    let items = state
        .market
        .catalog
        .get_items_by_seller(UserId::new(id))
        .await?;
    Ok(Json(items))
}
