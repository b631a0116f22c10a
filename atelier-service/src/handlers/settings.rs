use axum::{extract::State, Json};
use serde::Deserialize;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::BusinessSettings;
use crate::AppState;

#[tracing::instrument(skip(state))]
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<BusinessSettings>, AppError> {
    Ok(Json(state.db.get_settings().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSettingsRequest {
    #[validate(length(min = 1, message = "Business name cannot be empty"))]
    pub business_name: Option<String>,
    pub upi_id: Option<String>,
    #[validate(length(min = 1, message = "Country code cannot be empty"))]
    pub country_code: Option<String>,
    #[validate(range(min = 1.0, message = "Markup multiplier must be at least 1"))]
    pub default_markup_multiplier: Option<f64>,
    #[validate(range(min = 0.0, max = 100.0, message = "GST must be a percentage"))]
    pub gst_percent: Option<f64>,
}

#[tracing::instrument(skip(state, request))]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<BusinessSettings>, AppError> {
    request.validate()?;

    let mut settings = state.db.get_settings().await?;
    if let Some(business_name) = request.business_name {
        settings.business_name = business_name;
    }
    if let Some(upi_id) = request.upi_id {
        settings.upi_id = upi_id;
    }
    if let Some(country_code) = request.country_code {
        settings.country_code = country_code;
    }
    if let Some(multiplier) = request.default_markup_multiplier {
        settings.default_markup_multiplier = multiplier;
    }
    if let Some(gst_percent) = request.gst_percent {
        settings.gst_percent = gst_percent;
    }

    state.db.update_settings(&settings).await?;
    Ok(Json(settings))
}
