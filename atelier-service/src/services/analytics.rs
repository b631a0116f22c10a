//! Derived financial aggregation: per-entity and per-period ROI, and the
//! monthly income/expense rollup with staff salary accrual.
//!
//! Read-only. The pure functions compute over in-memory slices; the async
//! wrappers feed them fresh collection scans. A bill that fails to
//! deserialize or an entity that cannot be resolved degrades to a logged
//! skip or an "Unknown" placeholder, never to a failed aggregate.

use atelier_core::error::AppError;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::{
    AttendanceRecord, AttendanceStatus, Bill, BillLineItem, ExpenseEntry, IncomeEntry,
    LineItemKind, SalaryMode, StaffMember,
};
use crate::services::database::AtelierDb;

/// Hours assumed for a confirmed attendance day with no recorded hours.
const DEFAULT_HOURS_PER_DAY: f64 = 8.0;

/// Profit-margin percentage at or above which the monthly trend reads
/// "up"; below zero it reads "down". Fixed business constants.
const TREND_UP_MARGIN: f64 = 15.0;

/// Optional date window, inclusive on both ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoiWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RoiWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if instant > end {
                return false;
            }
        }
        true
    }
}

/// Display metadata for source entities, keyed by id per kind.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    names: HashMap<(LineItemKind, String), (String, String)>,
}

impl EntityCatalog {
    pub fn insert(&mut self, kind: LineItemKind, id: &str, name: &str, category: &str) {
        self.names
            .insert((kind, id.to_string()), (name.to_string(), category.to_string()));
    }

    /// Resolve an entity for display; a dangling reference yields the
    /// "Unknown" placeholder rather than an error.
    pub fn resolve(&self, kind: LineItemKind, id: &str) -> (String, String) {
        self.names
            .get(&(kind, id.to_string()))
            .cloned()
            .unwrap_or_else(|| ("Unknown".to_string(), String::new()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRoi {
    pub entity_id: String,
    pub kind: LineItemKind,
    pub name: String,
    pub category: String,
    pub total_income: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    pub roi_percentage: f64,
    pub item_count: usize,
    pub avg_profit: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRoi {
    pub total_income: f64,
    pub total_cost: f64,
    pub net_profit: f64,
    pub roi_percentage: f64,
    pub staff: Vec<EntityRoi>,
    pub inventory: Vec<EntityRoi>,
    pub services: Vec<EntityRoi>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_profit: f64,
    pub profit_margin: f64,
    pub trend: Trend,
    pub billed_income: f64,
    pub manual_income: f64,
    pub cost_of_goods: f64,
    pub manual_expenses: f64,
    pub accrued_salaries: f64,
}

/// ROI is net profit over cost; a zero cost basis reads as 0%, never a
/// division by zero.
pub fn roi_percentage(net_profit: f64, total_cost: f64) -> f64 {
    if total_cost > 0.0 {
        net_profit / total_cost * 100.0
    } else {
        0.0
    }
}

/// The priced rows of a bill. A parent with sub-items is a grouping row
/// whose amount merely sums its children, so only its children are
/// counted; flat items count as themselves.
fn priced_rows(bill: &Bill) -> impl Iterator<Item = &BillLineItem> {
    bill.items.iter().flat_map(|item| {
        if item.has_sub_items() {
            item.sub_items.iter().collect::<Vec<_>>()
        } else {
            vec![item]
        }
    })
}

fn finish_entity(
    kind: LineItemKind,
    entity_id: &str,
    income: f64,
    cost: f64,
    count: usize,
    catalog: &EntityCatalog,
) -> EntityRoi {
    let (name, category) = catalog.resolve(kind, entity_id);
    let net_profit = income - cost;
    EntityRoi {
        entity_id: entity_id.to_string(),
        kind,
        name,
        category,
        total_income: income,
        total_cost: cost,
        net_profit,
        roi_percentage: roi_percentage(net_profit, cost),
        item_count: count,
        avg_profit: if count > 0 {
            net_profit / count as f64
        } else {
            0.0
        },
    }
}

/// ROI for one entity over a window: income is the billed amounts of its
/// matching rows, cost is `cost * quantity` per row.
pub fn entity_roi(
    bills: &[Bill],
    kind: LineItemKind,
    entity_id: &str,
    window: &RoiWindow,
    catalog: &EntityCatalog,
) -> EntityRoi {
    let mut income = 0.0;
    let mut cost = 0.0;
    let mut count = 0usize;

    for bill in bills.iter().filter(|b| window.contains(b.date)) {
        for row in priced_rows(bill) {
            if row.kind == kind && row.source_id.as_deref() == Some(entity_id) {
                income += row.amount;
                cost += row.cost * row.quantity;
                count += 1;
            }
        }
    }

    finish_entity(kind, entity_id, income, cost, count, catalog)
}

/// Period rollup in a single pass over the bills: shop income is the sum
/// of billed totals, cost is the cost-of-goods across all priced rows,
/// and per-entity totals accumulate alongside. Equivalent to calling
/// `entity_roi` once per distinct source id, without the rescans.
pub fn period_roi(bills: &[Bill], window: &RoiWindow, catalog: &EntityCatalog) -> PeriodRoi {
    let mut total_income = 0.0;
    let mut total_cost = 0.0;
    let mut per_entity: HashMap<(LineItemKind, String), (f64, f64, usize)> = HashMap::new();

    for bill in bills.iter().filter(|b| window.contains(b.date)) {
        total_income += bill.total_amount;
        for row in priced_rows(bill) {
            let row_cost = row.cost * row.quantity;
            total_cost += row_cost;
            if let Some(source_id) = row.source_id.as_deref() {
                let entry = per_entity
                    .entry((row.kind, source_id.to_string()))
                    .or_insert((0.0, 0.0, 0));
                entry.0 += row.amount;
                entry.1 += row_cost;
                entry.2 += 1;
            }
        }
    }

    let mut staff = Vec::new();
    let mut inventory = Vec::new();
    let mut services = Vec::new();
    for ((kind, entity_id), (income, cost, count)) in per_entity {
        let entity = finish_entity(kind, &entity_id, income, cost, count, catalog);
        match kind {
            LineItemKind::Staff => staff.push(entity),
            LineItemKind::Inventory => inventory.push(entity),
            LineItemKind::Service => services.push(entity),
        }
    }

    let by_roi_desc = |a: &EntityRoi, b: &EntityRoi| {
        b.roi_percentage
            .partial_cmp(&a.roi_percentage)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    };
    staff.sort_by(by_roi_desc);
    inventory.sort_by(by_roi_desc);
    services.sort_by(by_roi_desc);

    let net_profit = total_income - total_cost;
    PeriodRoi {
        total_income,
        total_cost,
        net_profit,
        roi_percentage: roi_percentage(net_profit, total_cost),
        staff,
        inventory,
        services,
    }
}

/// `[start, end)` bounds of a calendar month in UTC.
pub fn month_window(year: i32, month: u32) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first of month is always valid");
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .expect("first of month is always valid");
    (start, end)
}

fn in_month(instant: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    instant >= start && instant < end
}

/// Salary attributed to one staff member for the month. Monthly-mode
/// staff accrue the full amount regardless of attendance (no pro-rating
/// for partial months; reproduced source behavior). Daily and hourly
/// modes accrue from confirmed attendance, with an 8-hour default when
/// hours are unrecorded.
pub fn accrued_salary(staff: &StaffMember, attendance_in_month: &[&AttendanceRecord]) -> f64 {
    let confirmed = || {
        attendance_in_month
            .iter()
            .filter(|r| r.staff_id == staff.id && r.status == AttendanceStatus::Confirmed)
    };
    match staff.salary_mode {
        SalaryMode::Monthly => staff.salary_amount,
        SalaryMode::Daily => staff.salary_amount * confirmed().count() as f64,
        SalaryMode::Hourly => {
            let hours: f64 = confirmed()
                .map(|r| r.hours_worked.unwrap_or(DEFAULT_HOURS_PER_DAY))
                .sum();
            staff.salary_amount * hours
        }
    }
}

/// Shop-wide income vs. expenses for one calendar month.
pub fn monthly_summary(
    bills: &[Bill],
    incomes: &[IncomeEntry],
    expenses: &[ExpenseEntry],
    staff: &[StaffMember],
    attendance: &[AttendanceRecord],
    year: i32,
    month: u32,
) -> MonthlySummary {
    let (start, end) = month_window(year, month);

    let month_bills: Vec<&Bill> = bills
        .iter()
        .filter(|b| in_month(b.date, start, end))
        .collect();

    let billed_income: f64 = month_bills.iter().map(|b| b.total_amount).sum();
    let cost_of_goods: f64 = month_bills
        .iter()
        .flat_map(|b| priced_rows(b))
        .map(|row| row.cost * row.quantity)
        .sum();

    let manual_income: f64 = incomes
        .iter()
        .filter(|e| in_month(e.date, start, end))
        .map(|e| e.amount)
        .sum();
    let manual_expenses: f64 = expenses
        .iter()
        .filter(|e| in_month(e.date, start, end))
        .map(|e| e.amount)
        .sum();

    let month_attendance: Vec<&AttendanceRecord> = attendance
        .iter()
        .filter(|r| in_month(r.date, start, end))
        .collect();
    let accrued_salaries: f64 = staff
        .iter()
        .filter(|s| s.active)
        .map(|s| accrued_salary(s, &month_attendance))
        .sum();

    let total_income = billed_income + manual_income;
    let total_expenses = cost_of_goods + manual_expenses + accrued_salaries;
    let net_profit = total_income - total_expenses;
    let profit_margin = if total_income > 0.0 {
        net_profit / total_income * 100.0
    } else {
        0.0
    };
    let trend = if profit_margin >= TREND_UP_MARGIN {
        Trend::Up
    } else if profit_margin < 0.0 {
        Trend::Down
    } else {
        Trend::Neutral
    };

    MonthlySummary {
        year,
        month,
        total_income,
        total_expenses,
        net_profit,
        profit_margin,
        trend,
        billed_income,
        manual_income,
        cost_of_goods,
        manual_expenses,
        accrued_salaries,
    }
}

/// Build the display catalog from the source collections. A collection
/// that fails to read degrades to placeholders for its entities; the
/// aggregate still computes.
pub async fn load_catalog(db: &AtelierDb) -> EntityCatalog {
    let mut catalog = EntityCatalog::default();

    match db.list_staff().await {
        Ok(members) => {
            for member in &members {
                catalog.insert(LineItemKind::Staff, &member.id, &member.name, &member.role);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to load staff for ROI display"),
    }
    match db.list_inventory().await {
        Ok(items) => {
            for item in &items {
                catalog.insert(LineItemKind::Inventory, &item.id, &item.name, &item.category);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to load inventory for ROI display"),
    }
    match db.list_work_descriptions().await {
        Ok(works) => {
            for work in &works {
                catalog.insert(LineItemKind::Service, &work.id, &work.name, &work.category);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to load work descriptions for ROI display"),
    }

    catalog
}

/// Entity ROI over a fresh scan.
pub async fn compute_entity_roi(
    db: &AtelierDb,
    kind: LineItemKind,
    entity_id: &str,
    window: RoiWindow,
) -> Result<EntityRoi, AppError> {
    let bills = db.all_bills_lenient().await?;
    let catalog = load_catalog(db).await;
    Ok(entity_roi(&bills, kind, entity_id, &window, &catalog))
}

/// Period ROI over a fresh scan.
pub async fn compute_period_roi(
    db: &AtelierDb,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<PeriodRoi, AppError> {
    let bills = db.all_bills_lenient().await?;
    let catalog = load_catalog(db).await;
    let window = RoiWindow {
        start: Some(start),
        end: Some(end),
    };
    Ok(period_roi(&bills, &window, &catalog))
}

/// Monthly income/expense rollup over fresh scans.
pub async fn compute_monthly_summary(
    db: &AtelierDb,
    year: i32,
    month: u32,
) -> Result<MonthlySummary, AppError> {
    let (start, end) = month_window(year, month);
    let bills = db.all_bills_lenient().await?;
    let incomes = db.list_income_between(start, end).await?;
    let expenses = db.list_expenses_between(start, end).await?;
    let staff = db.list_staff().await?;
    let attendance = db.list_attendance_between(start, end).await?;
    Ok(monthly_summary(
        &bills,
        &incomes,
        &expenses,
        &staff,
        &attendance,
        year,
        month,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_window_handles_december() {
        let (start, end) = month_window(2024, 12);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn roi_guard_never_divides_by_zero() {
        assert_eq!(roi_percentage(120.0, 0.0), 0.0);
        assert_eq!(roi_percentage(-50.0, 0.0), 0.0);
        assert!((roi_percentage(120.0, 180.0) - 66.666_666_666_666_67).abs() < 1e-9);
    }

    #[test]
    fn unknown_entity_resolves_to_placeholder() {
        let catalog = EntityCatalog::default();
        let (name, category) = catalog.resolve(LineItemKind::Staff, "ghost");
        assert_eq!(name, "Unknown");
        assert_eq!(category, "");
    }
}
