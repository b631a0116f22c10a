//! Bill and line-item models.
//!
//! Documents keep the store's historical camelCase field names so that the
//! maintenance tooling and the normal CRUD path read the same collection.

use crate::models::datetime::opt_chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// Payment state of a bill, derived from `totalAmount` and `paidAmount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Paid,
    Partial,
    Unpaid,
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillStatus::Paid => write!(f, "paid"),
            BillStatus::Partial => write!(f, "partial"),
            BillStatus::Unpaid => write!(f, "unpaid"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Flat,
    Percent,
}

/// Source entity a line item bills against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineItemKind {
    Service,
    Inventory,
    Staff,
}

impl std::fmt::Display for LineItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineItemKind::Service => write!(f, "service"),
            LineItemKind::Inventory => write!(f, "inventory"),
            LineItemKind::Staff => write!(f, "staff"),
        }
    }
}

/// One priced row on a bill. `subItems` nests at most one level; the
/// billing service rejects deeper nesting at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillLineItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LineItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub description: String,
    pub quantity: f64,
    /// Price charged to the customer per unit.
    pub rate: f64,
    /// Internal cost basis per unit. Margin compares `cost` against
    /// `rate`, never against `amount`.
    pub cost: f64,
    /// `quantity * rate` for a leaf; sum of sub-item amounts for a parent.
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_items: Vec<BillLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl BillLineItem {
    pub fn has_sub_items(&self) -> bool {
        !self.sub_items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Card,
}

/// A recorded payment against a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEntry {
    pub id: String,
    pub amount: f64,
    pub mode: PaymentMode,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_url: Option<String>,
}

/// A priced, payable record presented to a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable sequential label, e.g. `Bill007`.
    pub bill_id: String,
    /// Numeric part of `billId`; unique across all bills.
    pub bill_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Point in time the bill was issued. Drives sequence assignment.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub due_date: Option<DateTime<Utc>>,
    pub items: Vec<BillLineItem>,
    pub subtotal: f64,
    pub gst_percent: f64,
    pub gst_amount: f64,
    pub discount: f64,
    pub discount_type: DiscountType,
    pub total_amount: f64,
    pub paid_amount: f64,
    /// Always `totalAmount - paidAmount`; negative means overpayment and
    /// is surfaced as-is.
    pub balance: f64,
    pub status: BillStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<PaymentEntry>,
}

/// Filter parameters for listing bills.
#[derive(Debug, Clone, Default)]
pub struct ListBillsFilter {
    pub status: Option<BillStatus>,
    pub customer_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}
