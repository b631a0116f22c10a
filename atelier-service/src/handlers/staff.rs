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

use crate::models::{AttendanceRecord, AttendanceStatus, SalaryMode, StaffMember};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Role cannot be empty"))]
    pub role: String,
    pub phone: Option<String>,
    #[validate(range(min = 0.0, message = "Billing rate cannot be negative"))]
    pub billing_rate: f64,
    #[validate(range(min = 0.0, message = "Cost rate cannot be negative"))]
    pub cost_rate: f64,
    pub salary_mode: SalaryMode,
    #[validate(range(min = 0.0, message = "Salary cannot be negative"))]
    pub salary_amount: f64,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct StaffResponse {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub billing_rate: f64,
    pub cost_rate: f64,
    pub salary_mode: SalaryMode,
    pub salary_amount: f64,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
}

impl From<StaffMember> for StaffResponse {
    fn from(member: StaffMember) -> Self {
        Self {
            id: member.id,
            name: member.name,
            role: member.role,
            phone: member.phone,
            billing_rate: member.billing_rate,
            cost_rate: member.cost_rate,
            salary_mode: member.salary_mode,
            salary_amount: member.salary_amount,
            active: member.active,
            joined_at: member.joined_at,
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_staff(
    State(state): State<AppState>,
    Json(request): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<StaffResponse>), AppError> {
    request.validate()?;

    let member = StaffMember {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        role: request.role,
        phone: request.phone,
        billing_rate: request.billing_rate,
        cost_rate: request.cost_rate,
        salary_mode: request.salary_mode,
        salary_amount: request.salary_amount,
        active: true,
        joined_at: request.joined_at.unwrap_or_else(Utc::now),
    };

    state.db.insert_staff(&member).await?;
    Ok((StatusCode::CREATED, Json(StaffResponse::from(member))))
}

#[tracing::instrument(skip(state))]
pub async fn list_staff(
    State(state): State<AppState>,
) -> Result<Json<Vec<StaffResponse>>, AppError> {
    let members = state.db.list_staff().await?;
    Ok(Json(members.into_iter().map(StaffResponse::from).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StaffResponse>, AppError> {
    let member = state
        .db
        .get_staff(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found: {}", id)))?;
    Ok(Json(StaffResponse::from(member)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStaffRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Role cannot be empty"))]
    pub role: Option<String>,
    pub phone: Option<String>,
    pub billing_rate: Option<f64>,
    pub cost_rate: Option<f64>,
    pub salary_mode: Option<SalaryMode>,
    pub salary_amount: Option<f64>,
    pub active: Option<bool>,
}

#[tracing::instrument(skip(state, request))]
pub async fn update_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<StaffResponse>, AppError> {
    request.validate()?;

    let mut member = state
        .db
        .get_staff(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found: {}", id)))?;

    if let Some(name) = request.name {
        member.name = name;
    }
    if let Some(role) = request.role {
        member.role = role;
    }
    if request.phone.is_some() {
        member.phone = request.phone;
    }
    if let Some(billing_rate) = request.billing_rate {
        member.billing_rate = billing_rate;
    }
    if let Some(cost_rate) = request.cost_rate {
        member.cost_rate = cost_rate;
    }
    if let Some(salary_mode) = request.salary_mode {
        member.salary_mode = salary_mode;
    }
    if let Some(salary_amount) = request.salary_amount {
        member.salary_amount = salary_amount;
    }
    if let Some(active) = request.active {
        member.active = active;
    }

    state.db.replace_staff(&member).await?;
    Ok(Json(StaffResponse::from(member)))
}

#[tracing::instrument(skip(state))]
pub async fn delete_staff(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_staff(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Staff member not found: {}",
            id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordAttendanceRequest {
    pub date: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    #[validate(range(min = 0.0, max = 24.0, message = "Hours must be between 0 and 24"))]
    pub hours_worked: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct AttendanceResponse {
    pub id: String,
    pub staff_id: String,
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<f64>,
}

impl From<AttendanceRecord> for AttendanceResponse {
    fn from(record: AttendanceRecord) -> Self {
        Self {
            id: record.id,
            staff_id: record.staff_id,
            date: record.date,
            status: record.status,
            hours_worked: record.hours_worked,
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn record_attendance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RecordAttendanceRequest>,
) -> Result<(StatusCode, Json<AttendanceResponse>), AppError> {
    request.validate()?;

    // The record must reference a real staff member.
    state
        .db
        .get_staff(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Staff member not found: {}", id)))?;

    let record = AttendanceRecord {
        id: Uuid::new_v4().to_string(),
        staff_id: id,
        date: request.date.unwrap_or_else(Utc::now),
        status: request.status,
        hours_worked: request.hours_worked,
    };

    state.db.insert_attendance(&record).await?;
    Ok((StatusCode::CREATED, Json(AttendanceResponse::from(record))))
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[tracing::instrument(skip(state))]
pub async fn list_attendance(
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceResponse>>, AppError> {
    let records = state
        .db
        .list_attendance_between(query.start, query.end)
        .await?;
    Ok(Json(
        records.into_iter().map(AttendanceResponse::from).collect(),
    ))
}
