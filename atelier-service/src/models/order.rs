use crate::models::datetime::opt_chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Ready,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Cutting,
    Stitching,
    Finishing,
    Done,
}

/// One garment (or batch of identical garments) within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub description: String,
    pub status: OrderItemStatus,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assigned_staff: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_materials: Vec<String>,
    /// Measurements ("sizes") keyed by name, in the shop's working unit.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sizes: HashMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sketch_url: Option<String>,
}

/// A work request. Totals and assignment sets are derived unions across
/// the order's items, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub delivery_date: Option<DateTime<Utc>>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<String>,
}

impl Order {
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn assigned_staff(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|item| item.assigned_staff.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn required_materials(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .items
            .iter()
            .flat_map(|item| item.required_materials.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}
