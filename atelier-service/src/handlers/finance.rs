//! Manual income and expense entries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::{ExpenseEntry, IncomeEntry};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    pub date: Option<DateTime<Utc>>,
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: String,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: String,
    pub date: DateTime<Utc>,
    pub amount: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntryRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[tracing::instrument(skip(state, request))]
pub async fn create_income(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), AppError> {
    request.validate()?;

    let entry = IncomeEntry {
        id: Uuid::new_v4().to_string(),
        date: request.date.unwrap_or_else(Utc::now),
        amount: request.amount,
        category: request.category,
        note: request.note,
    };
    state.db.insert_income(&entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(EntryResponse {
            id: entry.id,
            date: entry.date,
            amount: entry.amount,
            category: entry.category,
            note: entry.note,
        }),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_income(
    State(state): State<AppState>,
    Query(query): Query<EntryRangeQuery>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let entries = state
        .db
        .list_income_between(query.start, query.end)
        .await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| EntryResponse {
                id: entry.id,
                date: entry.date,
                amount: entry.amount,
                category: entry.category,
                note: entry.note,
            })
            .collect(),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn delete_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_income(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Income entry not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, request))]
pub async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), AppError> {
    request.validate()?;

    let entry = ExpenseEntry {
        id: Uuid::new_v4().to_string(),
        date: request.date.unwrap_or_else(Utc::now),
        amount: request.amount,
        category: request.category,
        note: request.note,
    };
    state.db.insert_expense(&entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(EntryResponse {
            id: entry.id,
            date: entry.date,
            amount: entry.amount,
            category: entry.category,
            note: entry.note,
        }),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<EntryRangeQuery>,
) -> Result<Json<Vec<EntryResponse>>, AppError> {
    let entries = state
        .db
        .list_expenses_between(query.start, query.end)
        .await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| EntryResponse {
                id: entry.id,
                date: entry.date,
                amount: entry.amount,
                category: entry.category,
                note: entry.note,
            })
            .collect(),
    ))
}

#[tracing::instrument(skip(state))]
pub async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_expense(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Expense entry not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}
