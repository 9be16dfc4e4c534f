//! Item listing, lifecycle and catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use base64::Engine as _;
use common::{CategoryId, ItemId, ItemStatus, Money};
use domain::{ListItem, SellItem};
use market_store::{Category, ItemSummary, Store};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;
use crate::routes::auth::ActingUser;

// -- Request types --

#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    pub name: String,
    pub category_id: i64,
    pub price: i64,
    #[serde(default)]
    pub description: String,
    /// Base64-encoded image payload.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SellRequest {
    pub item_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub name: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ItemStatusResponse {
    pub id: ItemId,
    pub status: ItemStatus,
}

// -- Handlers --

/// POST /items — list a new item in the `Initial` state.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ActingUser(seller): ActingUser,
    Json(req): Json<ListItemRequest>,
) -> Result<(StatusCode, Json<ItemStatusResponse>), ApiError> {
    let image = match req.image.as_deref() {
        Some(encoded) if !encoded.is_empty() => base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ApiError::BadRequest(format!("Invalid image encoding: {e}")))?,
        _ => Vec::new(),
    };

    let cmd = ListItem::new(
        seller,
        req.name,
        CategoryId::new(req.category_id),
        Money::new(req.price),
    )
    .description(req.description)
    .image(image);

    let item = state
        .market
        .listings
        .list_item(cmd, state.market.deadline())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ItemStatusResponse {
            id: item.id,
            status: item.status,
        }),
    ))
}

/// POST /sell — put one of the acting user's items on sale.
#[tracing::instrument(skip(state))]
pub async fn sell<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ActingUser(user): ActingUser,
    Json(req): Json<SellRequest>,
) -> Result<Json<ItemStatusResponse>, ApiError> {
    let item = state
        .market
        .listings
        .sell_item(
            SellItem::new(user, ItemId::new(req.item_id)),
            state.market.deadline(),
        )
        .await?;

    Ok(Json(ItemStatusResponse {
        id: item.id,
        status: item.status,
    }))
}

/// GET /items — items currently on sale.
#[tracing::instrument(skip(state))]
pub async fn on_sale<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    let items = state
        .market
        .catalog
        .get_items_by_status(&[ItemStatus::OnSale])
        .await?;
    Ok(Json(items))
}

/// GET /items_sold — items that have been purchased.
#[tracing::instrument(skip(state))]
pub async fn sold<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    let items = state
        .market
        .catalog
        .get_items_by_status(&[ItemStatus::SoldOut])
        .await?;
    Ok(Json(items))
}

/// GET /items/{id} — one item with its category name, without its image.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<ItemSummary>, ApiError> {
    let item = state.market.catalog.get_item_summary(ItemId::new(id)).await?;
    Ok(Json(item))
}

/// GET /items/{id}/image — the stored image bytes.
#[tracing::instrument(skip(state))]
pub async fn image<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.market.catalog.get_item_image(ItemId::new(id)).await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}

/// GET /items/categories — the reference categories.
#[tracing::instrument(skip(state))]
pub async fn categories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.market.catalog.list_categories().await?))
}

/// GET /search?name= — items whose name contains the fragment.
#[tracing::instrument(skip(state))]
pub async fn search<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<ItemSummary>>, ApiError> {
    Ok(Json(state.market.catalog.search_items(&params.name).await?))
}
