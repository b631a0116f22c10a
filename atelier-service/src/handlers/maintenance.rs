//! Bill maintenance endpoints: the diagnose → preview → execute → verify
//! wizard surface.
//!
//! Diagnostics are plain GETs; every mutating step requires an explicit
//! `confirm: true` in the request body and returns a summary of exactly
//! what changed.

use axum::{extract::State, Json};
use serde::Deserialize;

use atelier_core::error::AppError;

use crate::services::migration::{
    self, DateCheckResult, DateFixResult, DiagnosisResult, DuplicateFixResult, MigrationPlan,
    MigrationResult,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirm: bool,
}

fn require_confirmation(request: &ConfirmRequest) -> Result<(), AppError> {
    if !request.confirm {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "this operation rewrites bill documents; pass confirm=true to proceed"
        )));
    }
    Ok(())
}

#[tracing::instrument(skip(state))]
pub async fn diagnose(State(state): State<AppState>) -> Result<Json<DiagnosisResult>, AppError> {
    Ok(Json(migration::diagnose(&state.db).await?))
}

#[tracing::instrument(skip(state))]
pub async fn migration_plan(
    State(state): State<AppState>,
) -> Result<Json<MigrationPlan>, AppError> {
    Ok(Json(migration::preview_migration(&state.db).await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn execute_migration(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<MigrationResult>, AppError> {
    require_confirmation(&request)?;
    Ok(Json(migration::execute_migration(&state.db).await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn fix_duplicates(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<DuplicateFixResult>, AppError> {
    require_confirmation(&request)?;
    Ok(Json(migration::fix_duplicates(&state.db).await?))
}

#[tracing::instrument(skip(state))]
pub async fn check_date_formats(
    State(state): State<AppState>,
) -> Result<Json<DateCheckResult>, AppError> {
    Ok(Json(migration::check_date_formats(&state.db).await?))
}

#[tracing::instrument(skip(state, request))]
pub async fn fix_date_formats(
    State(state): State<AppState>,
    Json(request): Json<ConfirmRequest>,
) -> Result<Json<DateFixResult>, AppError> {
    require_confirmation(&request)?;
    Ok(Json(migration::fix_date_formats(&state.db).await?))
}
