use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

/// How a staff member's pay is accrued into monthly expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalaryMode {
    Monthly,
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Rate charged to customers for this staff member's work.
    pub billing_rate: f64,
    /// Internal cost rate.
    pub cost_rate: f64,
    pub salary_mode: SalaryMode,
    /// Per month, per day, or per hour depending on `salaryMode`.
    pub salary_amount: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub joined_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Confirmed,
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub staff_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub status: AttendanceStatus,
    /// Absent on legacy records; confirmed days default to 8 hours.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<f64>,
}
