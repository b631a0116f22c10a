//! Read-only analytics endpoints: entity ROI, period ROI, and the
//! monthly income/expense summary.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use atelier_core::error::AppError;

use crate::models::LineItemKind;
use crate::services::analytics::{
    compute_entity_roi, compute_monthly_summary, compute_period_roi, EntityRoi, MonthlySummary,
    PeriodRoi, RoiWindow,
};
use crate::AppState;

fn parse_kind(kind: &str) -> Result<LineItemKind, AppError> {
    match kind {
        "staff" => Ok(LineItemKind::Staff),
        "inventory" => Ok(LineItemKind::Inventory),
        "service" => Ok(LineItemKind::Service),
        other => Err(AppError::BadRequest(anyhow::anyhow!(
            "unknown entity kind '{}'; expected staff, inventory, or service",
            other
        ))),
    }
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[tracing::instrument(skip(state))]
pub async fn entity_roi(
    State(state): State<AppState>,
    Path((kind, entity_id)): Path<(String, String)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<EntityRoi>, AppError> {
    let kind = parse_kind(&kind)?;
    let window = RoiWindow {
        start: query.start,
        end: query.end,
    };
    Ok(Json(
        compute_entity_roi(&state.db, kind, &entity_id, window).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[tracing::instrument(skip(state))]
pub async fn period_roi(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodRoi>, AppError> {
    if query.end < query.start {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "end of period is before its start"
        )));
    }
    Ok(Json(
        compute_period_roi(&state.db, query.start, query.end).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[tracing::instrument(skip(state))]
pub async fn monthly_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthlySummary>, AppError> {
    if !(1..=12).contains(&query.month) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "month must be between 1 and 12"
        )));
    }
    Ok(Json(
        compute_monthly_summary(&state.db, query.year, query.month).await?,
    ))
}
