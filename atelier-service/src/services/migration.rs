//! Bill maintenance operations: diagnosis, full renumbering, duplicate
//! repair, and date-storage-format repair.
//!
//! Every operation scans the `bills` collection fresh from raw BSON so a
//! malformed document can never wedge the tooling. Mutating operations are
//! idempotent batches with per-document continue-on-error semantics: one
//! failed write is recorded and the batch moves on.
//!
//! Known limitation: two operators running the same repair concurrently
//! are not guarded against. The tooling is operator-driven and
//! low-frequency; it re-reads the collection before every step instead.

use atelier_core::error::AppError;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use serde::Serialize;
use std::collections::HashMap;

use crate::services::database::AtelierDb;
use crate::services::metrics::record_maintenance_run;
use crate::services::numbering::{
    classify_bill_id, find_duplicates, plan_duplicate_fix, plan_renumbering, BillIdClass,
    BillRecord, DuplicateFix, DuplicateGroup, PlannedChange,
};

/// Timestamp-like fields checked by the date-format repair.
const DATE_FIELDS: [&str; 3] = ["createdAt", "date", "dueDate"];

/// How a timestamp-like field is physically stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFieldKind {
    /// The store's native datetime type. Correct.
    Native,
    /// Plain `{seconds, nanoseconds}` map. Needs fixing.
    SecondsMap,
    /// A string rendering of a date. Reported, never rewritten.
    StringValue,
    Missing,
    Other,
}

fn classify_date_value(value: Option<&Bson>) -> DateFieldKind {
    match value {
        None | Some(Bson::Null) => DateFieldKind::Missing,
        Some(Bson::DateTime(_)) => DateFieldKind::Native,
        Some(Bson::Document(map)) if seconds_from_map(map).is_some() => DateFieldKind::SecondsMap,
        Some(Bson::String(_)) => DateFieldKind::StringValue,
        Some(_) => DateFieldKind::Other,
    }
}

fn numeric(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(*n as i64),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) => Some(*n as i64),
        _ => None,
    }
}

/// Extract the `(seconds, nanoseconds)` pair from a legacy map. Both the
/// plain and underscore-prefixed key spellings occur in historical data.
fn seconds_from_map(map: &Document) -> Option<(i64, i64)> {
    let seconds = map
        .get("seconds")
        .or_else(|| map.get("_seconds"))
        .and_then(numeric)?;
    let nanos = map
        .get("nanoseconds")
        .or_else(|| map.get("_nanoseconds"))
        .and_then(numeric)
        .unwrap_or(0);
    Some((seconds, nanos))
}

/// Rebuild a native datetime from a legacy map, preserving the instant.
/// Reconstructs from the seconds component; display strings are never
/// reparsed, so there is no timezone drift.
fn native_from_seconds_map(map: &Document) -> Option<BsonDateTime> {
    let (seconds, nanos) = seconds_from_map(map)?;
    Some(BsonDateTime::from_millis(
        seconds * 1000 + nanos / 1_000_000,
    ))
}

/// Read a timestamp-like field for ordering purposes. Native datetimes and
/// legacy seconds maps both resolve to an instant; anything else is
/// treated as unreadable and sorts last.
fn read_date_value(value: Option<&Bson>) -> Option<DateTime<Utc>> {
    match value {
        Some(Bson::DateTime(dt)) => Some(dt.to_chrono()),
        Some(Bson::Document(map)) => native_from_seconds_map(map).map(|dt| dt.to_chrono()),
        _ => None,
    }
}

fn document_id(doc: &Document) -> String {
    match doc.get("_id") {
        Some(Bson::String(s)) => s.clone(),
        Some(Bson::ObjectId(oid)) => oid.to_hex(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn record_from_document(doc: &Document) -> BillRecord {
    BillRecord {
        id: document_id(doc),
        bill_id: doc.get_str("billId").ok().map(str::to_string),
        bill_number: doc.get("billNumber").and_then(numeric),
        date: read_date_value(doc.get("date")),
        customer_name: doc.get_str("customerName").ok().map(str::to_string),
    }
}

/// Scan the bills collection into records plus a map back to the original
/// `_id` values, which repairs need for their update filters.
async fn scan_bills(db: &AtelierDb) -> Result<(Vec<BillRecord>, HashMap<String, Bson>), AppError> {
    let mut cursor = db.bills_raw().find(doc! {}, None).await?;
    let mut records = Vec::new();
    let mut id_map = HashMap::new();

    while let Some(document) = cursor.try_next().await? {
        let record = record_from_document(&document);
        if record.id.is_empty() {
            tracing::warn!("Skipping bill document without an _id");
            continue;
        }
        if let Some(raw_id) = document.get("_id") {
            id_map.insert(record.id.clone(), raw_id.clone());
        }
        records.push(record);
    }

    Ok((records, id_map))
}

/// One row of the diagnosis listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillDiagnosisRow {
    pub id: String,
    pub bill_id: Option<String>,
    pub bill_number: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub class: BillIdClass,
    pub has_valid_date: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub total: usize,
    pub correct: usize,
    pub hash_style: usize,
    pub timestamp_style: usize,
    pub missing: usize,
    pub invalid_dates: usize,
    pub duplicates: Vec<DuplicateGroup>,
    pub bills: Vec<BillDiagnosisRow>,
}

/// Read-only classification of every bill identifier plus duplicate
/// detection. Never writes.
pub async fn diagnose(db: &AtelierDb) -> Result<DiagnosisResult, AppError> {
    let (records, _) = scan_bills(db).await?;

    let mut result = DiagnosisResult {
        total: records.len(),
        correct: 0,
        hash_style: 0,
        timestamp_style: 0,
        missing: 0,
        invalid_dates: 0,
        duplicates: find_duplicates(&records),
        bills: Vec::with_capacity(records.len()),
    };

    for record in &records {
        let class = classify_bill_id(record.bill_id.as_deref(), record.bill_number);
        match class {
            BillIdClass::Correct => result.correct += 1,
            BillIdClass::HashStyle => result.hash_style += 1,
            BillIdClass::TimestampStyle => result.timestamp_style += 1,
            BillIdClass::Missing => result.missing += 1,
        }
        if record.date.is_none() {
            result.invalid_dates += 1;
        }
        result.bills.push(BillDiagnosisRow {
            id: record.id.clone(),
            bill_id: record.bill_id.clone(),
            bill_number: record.bill_number,
            date: record.date,
            customer_name: record.customer_name.clone(),
            class,
            has_valid_date: record.date.is_some(),
        });
    }

    tracing::info!(
        total = result.total,
        correct = result.correct,
        duplicates = result.duplicates.len(),
        "Bill diagnosis complete"
    );

    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    pub total_bills: usize,
    pub changes: Vec<PlannedChange>,
}

/// Compute the full renumbering plan without writing anything. Runs of
/// this function over the same data produce identical plans.
pub async fn preview_migration(db: &AtelierDb) -> Result<MigrationPlan, AppError> {
    let (records, _) = scan_bills(db).await?;
    let changes = plan_renumbering(&records);
    Ok(MigrationPlan {
        total_bills: records.len(),
        changes,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteFailure {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub attempted: usize,
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<WriteFailure>,
}

/// Apply the full renumbering. Re-running immediately afterwards computes
/// an empty plan, because the assignment depends only on the stable
/// canonical order.
pub async fn execute_migration(db: &AtelierDb) -> Result<MigrationResult, AppError> {
    let (records, id_map) = scan_bills(db).await?;
    let plan = plan_renumbering(&records);

    let mut result = MigrationResult {
        attempted: plan.len(),
        updated: 0,
        failed: 0,
        failures: Vec::new(),
    };

    for change in &plan {
        let filter = match id_map.get(&change.id) {
            Some(raw_id) => doc! { "_id": raw_id.clone() },
            None => doc! { "_id": &change.id },
        };
        let update = doc! {
            "$set": {
                "billId": &change.new_bill_id,
                "billNumber": change.bill_number,
            }
        };
        match db.bills_raw().update_one(filter, update, None).await {
            Ok(_) => result.updated += 1,
            Err(e) => {
                tracing::error!(bill = %change.id, error = %e, "Failed to renumber bill");
                result.failed += 1;
                result.failures.push(WriteFailure {
                    id: change.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    record_maintenance_run("migrate", result.failed == 0);
    tracing::info!(
        attempted = result.attempted,
        updated = result.updated,
        failed = result.failed,
        "Bill renumbering complete"
    );

    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateFixResult {
    pub fixes: Vec<DuplicateFix>,
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<WriteFailure>,
}

/// Repair colliding identifiers only. The earliest holder of each
/// duplicated label keeps it; later holders get fresh numbers appended
/// after the current maximum. Every other bill is untouched.
pub async fn fix_duplicates(db: &AtelierDb) -> Result<DuplicateFixResult, AppError> {
    let (records, id_map) = scan_bills(db).await?;
    let fixes = plan_duplicate_fix(&records);

    let mut updated = 0;
    let mut failed = 0;
    let mut failures = Vec::new();

    for fix in &fixes {
        let filter = match id_map.get(&fix.doc_id) {
            Some(raw_id) => doc! { "_id": raw_id.clone() },
            None => doc! { "_id": &fix.doc_id },
        };
        let update = doc! {
            "$set": {
                "billId": &fix.new_bill_id,
                "billNumber": fix.new_bill_number,
            }
        };
        match db.bills_raw().update_one(filter, update, None).await {
            Ok(_) => updated += 1,
            Err(e) => {
                tracing::error!(bill = %fix.doc_id, error = %e, "Failed to repair duplicate");
                failed += 1;
                failures.push(WriteFailure {
                    id: fix.doc_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    record_maintenance_run("fix_duplicates", failed == 0);
    tracing::info!(
        repaired = updated,
        failed = failed,
        "Duplicate bill repair complete"
    );

    Ok(DuplicateFixResult {
        fixes,
        updated,
        failed,
        failures,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFieldReport {
    pub field: String,
    pub kind: DateFieldKind,
    /// Raw stored value, rendered for preview. Safe to show before and
    /// after the fix.
    pub raw: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCheckRow {
    pub id: String,
    pub bill_id: Option<String>,
    pub fields: Vec<DateFieldReport>,
    pub needs_fix: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateCheckResult {
    pub total: usize,
    pub needs_fix: usize,
    pub bills: Vec<DateCheckRow>,
}

/// Classify how `createdAt`, `date`, and `dueDate` are stored on every
/// bill. Read-only.
pub async fn check_date_formats(db: &AtelierDb) -> Result<DateCheckResult, AppError> {
    let mut cursor = db.bills_raw().find(doc! {}, None).await?;
    let mut result = DateCheckResult {
        total: 0,
        needs_fix: 0,
        bills: Vec::new(),
    };

    while let Some(document) = cursor.try_next().await? {
        result.total += 1;
        let mut row = DateCheckRow {
            id: document_id(&document),
            bill_id: document.get_str("billId").ok().map(str::to_string),
            fields: Vec::with_capacity(DATE_FIELDS.len()),
            needs_fix: false,
        };
        for field in DATE_FIELDS {
            let value = document.get(field);
            let kind = classify_date_value(value);
            if kind == DateFieldKind::SecondsMap {
                row.needs_fix = true;
            }
            row.fields.push(DateFieldReport {
                field: field.to_string(),
                kind,
                raw: value.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            });
        }
        if row.needs_fix {
            result.needs_fix += 1;
        }
        result.bills.push(row);
    }

    Ok(result)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFixRow {
    pub id: String,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFixResult {
    pub fixed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub details: Vec<DateFixRow>,
}

/// Convert legacy `{seconds, nanoseconds}` maps into native datetimes,
/// preserving the stored instant. Documents whose fields are already
/// native are skipped rather than rewritten, so re-running costs only the
/// scan plus the remaining defects.
pub async fn fix_date_formats(db: &AtelierDb) -> Result<DateFixResult, AppError> {
    let mut cursor = db.bills_raw().find(doc! {}, None).await?;
    let mut result = DateFixResult {
        fixed: 0,
        skipped: 0,
        failed: 0,
        details: Vec::new(),
    };

    while let Some(document) = cursor.try_next().await? {
        let id = document_id(&document);

        let mut set = Document::new();
        for field in DATE_FIELDS {
            if let Some(Bson::Document(map)) = document.get(field) {
                if let Some(native) = native_from_seconds_map(map) {
                    set.insert(field, Bson::DateTime(native));
                }
            }
        }

        if set.is_empty() {
            result.skipped += 1;
            result.details.push(DateFixRow {
                id,
                outcome: "skipped".to_string(),
                reason: Some("all date fields already native".to_string()),
            });
            continue;
        }

        let filter = match document.get("_id") {
            Some(raw_id) => doc! { "_id": raw_id.clone() },
            None => {
                result.failed += 1;
                result.details.push(DateFixRow {
                    id,
                    outcome: "failed".to_string(),
                    reason: Some("document has no _id".to_string()),
                });
                continue;
            }
        };

        match db
            .bills_raw()
            .update_one(filter, doc! { "$set": set }, None)
            .await
        {
            Ok(_) => {
                result.fixed += 1;
                result.details.push(DateFixRow {
                    id,
                    outcome: "fixed".to_string(),
                    reason: None,
                });
            }
            Err(e) => {
                tracing::error!(bill = %id, error = %e, "Failed to fix date formats");
                result.failed += 1;
                result.details.push(DateFixRow {
                    id,
                    outcome: "failed".to_string(),
                    reason: Some(e.to_string()),
                });
            }
        }
    }

    record_maintenance_run("fix_date_formats", result.failed == 0);
    tracing::info!(
        fixed = result.fixed,
        skipped = result.skipped,
        failed = result.failed,
        "Date format repair complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_map_converts_to_the_same_instant() {
        let map = doc! { "seconds": 1_700_000_000i64, "nanoseconds": 0i32 };
        let native = native_from_seconds_map(&map).unwrap();
        assert_eq!(native.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn underscore_keys_are_recognized() {
        let map = doc! { "_seconds": 1_700_000_000i64, "_nanoseconds": 500_000_000i32 };
        let native = native_from_seconds_map(&map).unwrap();
        assert_eq!(native.timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn classify_covers_all_storage_shapes() {
        assert_eq!(
            classify_date_value(Some(&Bson::DateTime(BsonDateTime::from_millis(0)))),
            DateFieldKind::Native
        );
        assert_eq!(
            classify_date_value(Some(&Bson::Document(
                doc! { "seconds": 1i64, "nanoseconds": 0i32 }
            ))),
            DateFieldKind::SecondsMap
        );
        assert_eq!(
            classify_date_value(Some(&Bson::String("2024-01-01".into()))),
            DateFieldKind::StringValue
        );
        assert_eq!(classify_date_value(None), DateFieldKind::Missing);
        assert_eq!(
            classify_date_value(Some(&Bson::Int64(5))),
            DateFieldKind::Other
        );
        // A map without a seconds component is not a legacy timestamp.
        assert_eq!(
            classify_date_value(Some(&Bson::Document(doc! { "foo": 1i32 }))),
            DateFieldKind::Other
        );
    }

    #[test]
    fn records_tolerate_malformed_documents() {
        let document = doc! {
            "_id": "b1",
            "billNumber": 3.0,
            "date": { "seconds": 1_700_000_000i64, "nanoseconds": 0i32 },
        };
        let record = record_from_document(&document);
        assert_eq!(record.id, "b1");
        assert_eq!(record.bill_number, Some(3));
        assert!(record.bill_id.is_none());
        assert!(record.date.is_some());
    }
}
