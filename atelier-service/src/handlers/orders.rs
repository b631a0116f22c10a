use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::{Order, OrderItem, OrderItemStatus, OrderStatus};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
    #[serde(default)]
    pub assigned_staff: Vec<String>,
    #[serde(default)]
    pub required_materials: Vec<String>,
    #[serde(default)]
    pub sizes: HashMap<String, f64>,
    pub sketch_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<OrderItemInput>,
    pub delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<String>,
    // Derived unions across the order's items.
    pub total_quantity: i64,
    pub assigned_staff: Vec<String>,
    pub required_materials: Vec<String>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let total_quantity = order.total_quantity();
        let assigned_staff = order.assigned_staff();
        let required_materials = order.required_materials();
        Self {
            id: order.id,
            customer_id: order.customer_id,
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            items: order.items,
            status: order.status,
            delivery_date: order.delivery_date,
            created_at: order.created_at,
            bill_id: order.bill_id,
            total_quantity,
            assigned_staff,
            required_materials,
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    request.validate()?;
    for item in &request.items {
        item.validate()?;
    }

    let order = Order {
        id: Uuid::new_v4().to_string(),
        customer_id: request.customer_id,
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        items: request
            .items
            .into_iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4().to_string(),
                description: item.description,
                status: OrderItemStatus::Pending,
                quantity: item.quantity,
                assigned_staff: item.assigned_staff,
                required_materials: item.required_materials,
                sizes: item.sizes,
                sketch_url: item.sketch_url,
            })
            .collect(),
        status: OrderStatus::Pending,
        delivery_date: request.delivery_date,
        created_at: Utc::now(),
        bill_id: None,
    };

    state.db.insert_order(&order).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

#[tracing::instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    let orders = state.db.list_orders().await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .db
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found: {}", id)))?;
    Ok(Json(OrderResponse::from(order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[tracing::instrument(skip(state, request))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let mut order = state
        .db
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found: {}", id)))?;

    order.status = request.status;
    state.db.replace_order(&order).await?;
    Ok(Json(OrderResponse::from(order)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderItemStatusRequest {
    pub status: OrderItemStatus,
}

#[tracing::instrument(skip(state, request))]
pub async fn update_order_item_status(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    Json(request): Json<UpdateOrderItemStatusRequest>,
) -> Result<Json<OrderResponse>, AppError> {
    let mut order = state
        .db
        .get_order(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order not found: {}", id)))?;

    let item = order
        .items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Order item not found: {}", item_id))
        })?;
    item.status = request.status;

    // When every garment is done the order is ready for pickup.
    if order
        .items
        .iter()
        .all(|item| item.status == OrderItemStatus::Done)
    {
        order.status = OrderStatus::Ready;
    } else if order.status == OrderStatus::Pending {
        order.status = OrderStatus::InProgress;
    }

    state.db.replace_order(&order).await?;
    Ok(Json(OrderResponse::from(order)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_order(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Order not found: {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
