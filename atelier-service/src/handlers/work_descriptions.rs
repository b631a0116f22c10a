use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::WorkDescription;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateWorkDescriptionRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,
    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub rate: f64,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: f64,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_work_description(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkDescriptionRequest>,
) -> Result<(StatusCode, Json<WorkDescription>), AppError> {
    request.validate()?;

    let work = WorkDescription {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        category: request.category,
        rate: request.rate,
        cost: request.cost,
    };

    state.db.insert_work_description(&work).await?;
    Ok((StatusCode::CREATED, Json(work)))
}

#[tracing::instrument(skip(state))]
pub async fn list_work_descriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkDescription>>, AppError> {
    Ok(Json(state.db.list_work_descriptions().await?))
}

#[tracing::instrument(skip(state))]
pub async fn delete_work_description(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_work_description(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Work description not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
