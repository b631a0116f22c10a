//! Bill handlers: creation, listing, payments, deletion, and export.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use atelier_core::error::AppError;

use crate::models::{
    Bill, BillLineItem, BillStatus, DiscountType, LineItemKind, ListBillsFilter, PaymentEntry,
    PaymentMode,
};
use crate::services::billing::{
    apply_payment, compute_totals, derive_balance_and_status, next_bill_number,
    normalize_line_items,
};
use crate::services::export::{
    bill_to_row, bills_export_filename, build_workbook, default_bill_columns,
};
use crate::services::metrics::record_bill_created;
use crate::services::numbering::canonicalize;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineItemInput {
    #[serde(rename = "type")]
    pub kind: LineItemKind,
    pub source_id: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Quantity cannot be negative"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub rate: f64,
    #[validate(range(min = 0.0, message = "Cost cannot be negative"))]
    pub cost: f64,
    #[serde(default)]
    pub sub_items: Vec<LineItemInput>,
}

impl LineItemInput {
    fn into_line_item(self) -> BillLineItem {
        BillLineItem {
            id: Uuid::new_v4().to_string(),
            kind: self.kind,
            source_id: self.source_id,
            description: self.description,
            quantity: self.quantity,
            rate: self.rate,
            cost: self.cost,
            amount: 0.0,
            sub_items: self
                .sub_items
                .into_iter()
                .map(LineItemInput::into_line_item)
                .collect(),
            parent_id: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBillRequest {
    pub customer_id: Option<String>,
    #[validate(length(min = 1, message = "Customer name cannot be empty"))]
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[validate(length(min = 1, message = "A bill needs at least one line item"))]
    pub items: Vec<LineItemInput>,
    pub gst_percent: Option<f64>,
    #[serde(default)]
    pub discount: f64,
    #[serde(default = "default_discount_type")]
    pub discount_type: DiscountType,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Paid amount cannot be negative"))]
    pub paid_amount: f64,
    pub order_id: Option<String>,
}

fn default_discount_type() -> DiscountType {
    DiscountType::Flat
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub amount: f64,
    pub mode: PaymentMode,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

impl From<PaymentEntry> for PaymentResponse {
    fn from(entry: PaymentEntry) -> Self {
        Self {
            id: entry.id,
            amount: entry.amount,
            mode: entry.mode,
            date: entry.date,
            note: entry.note,
            screenshot_url: entry.screenshot_url,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    pub id: String,
    pub bill_id: String,
    pub bill_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub items: Vec<BillLineItem>,
    pub subtotal: f64,
    pub gst_percent: f64,
    pub gst_amount: f64,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub balance: f64,
    pub status: BillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub payments: Vec<PaymentResponse>,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id,
            bill_id: bill.bill_id,
            bill_number: bill.bill_number,
            customer_id: bill.customer_id,
            customer_name: bill.customer_name,
            customer_phone: bill.customer_phone,
            date: bill.date,
            created_at: bill.created_at,
            due_date: bill.due_date,
            items: bill.items,
            subtotal: bill.subtotal,
            gst_percent: bill.gst_percent,
            gst_amount: bill.gst_amount,
            discount: bill.discount,
            discount_type: bill.discount_type,
            total_amount: bill.total_amount,
            paid_amount: bill.paid_amount,
            balance: bill.balance,
            status: bill.status,
            order_id: bill.order_id,
            payments: bill.payments.into_iter().map(PaymentResponse::from).collect(),
        }
    }
}

#[tracing::instrument(skip(state, request))]
pub async fn create_bill(
    State(state): State<AppState>,
    Json(request): Json<CreateBillRequest>,
) -> Result<(StatusCode, Json<BillResponse>), AppError> {
    request.validate()?;
    for item in &request.items {
        item.validate()?;
    }

    let settings = state.db.get_settings().await?;

    let items = normalize_line_items(
        request
            .items
            .into_iter()
            .map(LineItemInput::into_line_item)
            .collect(),
    )?;

    let gst_percent = request.gst_percent.unwrap_or(settings.gst_percent);
    let totals = compute_totals(&items, gst_percent, request.discount, request.discount_type);
    let (balance, status) = derive_balance_and_status(totals.total_amount, request.paid_amount);

    let bill_number = next_bill_number(state.db.max_bill_number().await?);
    let now = Utc::now();
    let bill = Bill {
        id: Uuid::new_v4().to_string(),
        bill_id: canonicalize(bill_number),
        bill_number,
        customer_id: request.customer_id,
        customer_name: request.customer_name,
        customer_phone: request.customer_phone,
        date: request.date.unwrap_or(now),
        created_at: now,
        due_date: request.due_date,
        items,
        subtotal: totals.subtotal,
        gst_percent,
        gst_amount: totals.gst_amount,
        discount: request.discount,
        discount_type: request.discount_type,
        total_amount: totals.total_amount,
        paid_amount: request.paid_amount,
        balance,
        status,
        order_id: request.order_id,
        payments: Vec::new(),
    };

    tracing::info!(
        bill = %bill.bill_id,
        customer = %bill.customer_name,
        total = bill.total_amount,
        "Creating bill"
    );

    state.db.insert_bill(&bill).await?;
    record_bill_created(&bill.status.to_string());

    Ok((StatusCode::CREATED, Json(BillResponse::from(bill))))
}

#[derive(Debug, Deserialize)]
pub struct ListBillsQuery {
    pub status: Option<BillStatus>,
    pub customer_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct ListBillsResponse {
    pub bills: Vec<BillResponse>,
    pub count: usize,
}

#[tracing::instrument(skip(state))]
pub async fn list_bills(
    State(state): State<AppState>,
    Query(query): Query<ListBillsQuery>,
) -> Result<Json<ListBillsResponse>, AppError> {
    let filter = ListBillsFilter {
        status: query.status,
        customer_id: query.customer_id,
        start_date: query.start,
        end_date: query.end,
    };
    let bills = state.db.list_bills(&filter).await?;
    let count = bills.len();
    Ok(Json(ListBillsResponse {
        bills: bills.into_iter().map(BillResponse::from).collect(),
        count,
    }))
}

#[tracing::instrument(skip(state))]
pub async fn get_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BillResponse>, AppError> {
    let bill = state
        .db
        .get_bill(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill not found: {}", id)))?;
    Ok(Json(BillResponse::from(bill)))
}

/// Deleting a bill is an explicit admin action; remaining bills keep
/// their numbers.
#[tracing::instrument(skip(state))]
pub async fn delete_bill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.db.delete_bill(&id).await? {
        return Err(AppError::NotFound(anyhow::anyhow!("Bill not found: {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 0.01, message = "Payment amount must be positive"))]
    pub amount: f64,
    pub mode: PaymentMode,
    pub note: Option<String>,
    pub screenshot_url: Option<String>,
}

#[tracing::instrument(skip(state, request))]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<BillResponse>, AppError> {
    request.validate()?;

    let mut bill = state
        .db
        .get_bill(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Bill not found: {}", id)))?;

    let entry = PaymentEntry {
        id: Uuid::new_v4().to_string(),
        amount: request.amount,
        mode: request.mode,
        date: Utc::now(),
        note: request.note,
        screenshot_url: request.screenshot_url,
    };

    apply_payment(&mut bill, entry);
    state.db.replace_bill(&bill).await?;

    tracing::info!(
        bill = %bill.bill_id,
        paid = bill.paid_amount,
        balance = bill.balance,
        "Payment recorded"
    );

    Ok(Json(BillResponse::from(bill)))
}

#[tracing::instrument(skip(state))]
pub async fn export_bills(
    State(state): State<AppState>,
    Query(query): Query<ListBillsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ListBillsFilter {
        status: query.status,
        customer_id: query.customer_id,
        start_date: query.start,
        end_date: query.end,
    };
    let bills = state.db.list_bills(&filter).await?;
    let rows: Vec<serde_json::Value> = bills.iter().map(bill_to_row).collect();
    let bytes = build_workbook(&rows, &default_bill_columns())?;
    let filename = bills_export_filename(Utc::now());

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}
