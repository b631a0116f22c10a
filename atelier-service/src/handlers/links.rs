//! Deep-link generation: WhatsApp messages and UPI payment intents.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use atelier_core::error::AppError;

use crate::services::links::{upi_link, whatsapp_link};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct WhatsAppLinkRequest {
    #[validate(length(min = 1, message = "Phone cannot be empty"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Message cannot be empty"))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub url: String,
}

#[tracing::instrument(skip(state, request))]
pub async fn whatsapp(
    State(state): State<AppState>,
    Json(request): Json<WhatsAppLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    request.validate()?;
    let settings = state.db.get_settings().await?;
    Ok(Json(LinkResponse {
        url: whatsapp_link(&request.phone, &request.message, &settings),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpiLinkRequest {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "Note cannot be empty"))]
    pub note: String,
    pub reference: Option<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn upi(
    State(state): State<AppState>,
    Json(request): Json<UpiLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    request.validate()?;
    let settings = state.db.get_settings().await?;
    if settings.upi_id.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "no UPI id configured in business settings"
        )));
    }
    Ok(Json(LinkResponse {
        url: upi_link(
            request.amount,
            &request.note,
            request.reference.as_deref(),
            &settings,
        ),
    }))
}
