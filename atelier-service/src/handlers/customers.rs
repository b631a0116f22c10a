use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::Customer;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Phone cannot be empty"))]
    pub phone: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Phone cannot be empty"))]
    pub phone: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            phone: customer.phone,
            email: customer.email,
            address: customer.address,
            notes: customer.notes,
            created_at: customer.created_at,
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    request.validate()?;

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        phone: request.phone,
        email: request.email,
        address: request.address,
        notes: request.notes,
        created_at: Utc::now(),
    };

    state.db.insert_customer(&customer).await?;
    Ok((StatusCode::CREATED, Json(CustomerResponse::from(customer))))
}

#[tracing::instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state.db.list_customers().await?;
    Ok(Json(
        customers.into_iter().map(CustomerResponse::from).collect(),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state
        .db
        .get_customer(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found: {}", id)))?;
    Ok(Json(CustomerResponse::from(customer)))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    request.validate()?;

    let mut customer = state
        .db
        .get_customer(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found: {}", id)))?;

    if let Some(name) = request.name {
        customer.name = name;
    }
    if let Some(phone) = request.phone {
        customer.phone = phone;
    }
    if request.email.is_some() {
        customer.email = request.email;
    }
    if request.address.is_some() {
        customer.address = request.address;
    }
    if request.notes.is_some() {
        customer.notes = request.notes;
    }

    state.db.replace_customer(&customer).await?;
    Ok(Json(CustomerResponse::from(customer)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_customer(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Customer not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
