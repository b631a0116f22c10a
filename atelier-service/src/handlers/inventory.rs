use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::InventoryItem;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInventoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,
    #[validate(length(min = 1, message = "Unit cannot be empty"))]
    pub unit: String,
    #[validate(range(min = 0.0, message = "Stock cannot be negative"))]
    pub quantity_in_stock: f64,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost_per_unit: f64,
    pub selling_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity_in_stock: f64,
    pub cost_per_unit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
    /// The price a line item would charge for this item today, after the
    /// configured markup fallback.
    pub effective_selling_price: f64,
}

impl InventoryResponse {
    fn from_item(item: InventoryItem, default_markup_multiplier: f64) -> Self {
        let effective_selling_price = item.effective_selling_price(default_markup_multiplier);
        Self {
            id: item.id,
            name: item.name,
            category: item.category,
            unit: item.unit,
            quantity_in_stock: item.quantity_in_stock,
            cost_per_unit: item.cost_per_unit,
            selling_price: item.selling_price,
            effective_selling_price,
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(request): Json<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<InventoryResponse>), AppError> {
    request.validate()?;
    let settings = state.db.get_settings().await?;

    let item = InventoryItem {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        category: request.category,
        unit: request.unit,
        quantity_in_stock: request.quantity_in_stock,
        cost_per_unit: request.cost_per_unit,
        selling_price: request.selling_price,
    };

    state.db.insert_inventory(&item).await?;
    Ok((
        StatusCode::CREATED,
        Json(InventoryResponse::from_item(
            item,
            settings.default_markup_multiplier,
        )),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_inventory(
    State(state): State<AppState>,
) -> Result<Json<Vec<InventoryResponse>>, AppError> {
    let settings = state.db.get_settings().await?;
    let items = state.db.list_inventory().await?;
    Ok(Json(
        items
            .into_iter()
            .map(|item| InventoryResponse::from_item(item, settings.default_markup_multiplier))
            .collect(),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryResponse>, AppError> {
    let settings = state.db.get_settings().await?;
    let item = state
        .db
        .get_inventory(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Inventory item not found: {}", id)))?;
    Ok(Json(InventoryResponse::from_item(
        item,
        settings.default_markup_multiplier,
    )))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInventoryRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,
    pub unit: Option<String>,
    pub cost_per_unit: Option<f64>,
    pub selling_price: Option<f64>,
}

#[tracing::instrument(skip(state, request))]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    request.validate()?;
    let settings = state.db.get_settings().await?;

    let mut item = state
        .db
        .get_inventory(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Inventory item not found: {}", id)))?;

    if let Some(name) = request.name {
        item.name = name;
    }
    if let Some(category) = request.category {
        item.category = category;
    }
    if let Some(unit) = request.unit {
        item.unit = unit;
    }
    if let Some(cost_per_unit) = request.cost_per_unit {
        item.cost_per_unit = cost_per_unit;
    }
    if request.selling_price.is_some() {
        item.selling_price = request.selling_price;
    }

    state.db.replace_inventory(&item).await?;
    Ok(Json(InventoryResponse::from_item(
        item,
        settings.default_markup_multiplier,
    )))
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed quantity: positive restocks, negative consumes.
    pub delta: f64,
}

#[tracing::instrument(skip(state, request))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AdjustStockRequest>,
) -> Result<Json<InventoryResponse>, AppError> {
    let settings = state.db.get_settings().await?;

    state
        .db
        .get_inventory(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Inventory item not found: {}", id)))?;

    state.db.adjust_inventory_stock(&id, request.delta).await?;

    let item = state
        .db
        .get_inventory(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Inventory item not found: {}", id)))?;
    Ok(Json(InventoryResponse::from_item(
        item,
        settings.default_markup_multiplier,
    )))
}

#[tracing::instrument(skip(state))]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_inventory(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Inventory item not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
