//! Pure bill-identifier logic: classification, canonicalization, ordering,
//! and renumbering plans.
//!
//! Everything here is deterministic over in-memory records; the migration
//! service feeds it fresh collection scans and applies the resulting plans.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Minimal view of a bill document used for identifier work. Built from
/// raw BSON so malformed documents still participate.
#[derive(Debug, Clone)]
pub struct BillRecord {
    pub id: String,
    pub bill_id: Option<String>,
    pub bill_number: Option<i64>,
    pub date: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
}

/// Closed classification of a stored `billId` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillIdClass {
    /// Matches `Bill` + at least three digits, and the numeric suffix
    /// equals the stored `billNumber`.
    Correct,
    /// Legacy `#NNN` label.
    HashStyle,
    /// Label derived from a raw epoch timestamp (ten or more digits).
    TimestampStyle,
    /// Absent or unparseable.
    Missing,
}

/// The canonical label for a sequence number: `Bill` + zero-padded to a
/// minimum width of 3. Numbers >= 1000 keep their full width.
pub fn canonicalize(n: i64) -> String {
    format!("Bill{:03}", n)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Classify a stored `billId` against the stored `billNumber`.
///
/// Independent of any repair logic: diagnosis uses this to report, the
/// migration uses the plan functions below to fix.
pub fn classify_bill_id(bill_id: Option<&str>, bill_number: Option<i64>) -> BillIdClass {
    let label = match bill_id {
        Some(l) if !l.trim().is_empty() => l.trim(),
        _ => return BillIdClass::Missing,
    };

    if let Some(rest) = label.strip_prefix('#') {
        if all_digits(rest) {
            return BillIdClass::HashStyle;
        }
    }

    if all_digits(label) && label.len() >= 10 {
        return BillIdClass::TimestampStyle;
    }

    if let Some(digits) = label.strip_prefix("Bill") {
        if all_digits(digits) {
            // An epoch-length suffix is a timestamp that got prefixed,
            // unless it genuinely matches the stored number.
            if let (Ok(parsed), Some(number)) = (digits.parse::<i64>(), bill_number) {
                if parsed == number && digits.len() >= 3 {
                    return BillIdClass::Correct;
                }
            }
            if digits.len() >= 10 {
                return BillIdClass::TimestampStyle;
            }
        }
    }

    BillIdClass::Missing
}

/// Sort bills into canonical assignment order: ascending `date`, ties
/// broken by document id (lexical ascending). Bills with a missing or
/// unreadable date sort after every valid-dated bill, keeping re-runs
/// stable.
pub fn sort_canonical(records: &mut [BillRecord]) {
    records.sort_by(|a, b| match (a.date, b.date) {
        (Some(da), Some(db)) => da.cmp(&db).then_with(|| a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}

/// One entry of a renumbering plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedChange {
    pub id: String,
    pub old_bill_id: Option<String>,
    pub new_bill_id: String,
    pub bill_number: i64,
    pub date: Option<DateTime<Utc>>,
}

/// Compute the full renumbering: every bill gets `billNumber = 1..N` in
/// canonical order, and the plan lists only the bills whose stored
/// identifier differs from the computed one. Running the plan and then
/// recomputing yields an empty plan.
pub fn plan_renumbering(records: &[BillRecord]) -> Vec<PlannedChange> {
    let mut ordered: Vec<BillRecord> = records.to_vec();
    sort_canonical(&mut ordered);

    let mut changes = Vec::new();
    for (index, record) in ordered.iter().enumerate() {
        let number = (index + 1) as i64;
        let label = canonicalize(number);
        let unchanged =
            record.bill_number == Some(number) && record.bill_id.as_deref() == Some(label.as_str());
        if !unchanged {
            changes.push(PlannedChange {
                id: record.id.clone(),
                old_bill_id: record.bill_id.clone(),
                new_bill_id: label,
                bill_number: number,
                date: record.date,
            });
        }
    }
    changes
}

/// A `billId` value held by more than one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub bill_id: String,
    pub doc_ids: Vec<String>,
}

/// Find every `billId` shared by more than one document. Groups and their
/// member ids come back in canonical order for stable reporting.
pub fn find_duplicates(records: &[BillRecord]) -> Vec<DuplicateGroup> {
    let mut ordered: Vec<BillRecord> = records.to_vec();
    sort_canonical(&mut ordered);

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for record in &ordered {
        let Some(label) = record.bill_id.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|g| g.bill_id == label) {
            Some(group) => group.doc_ids.push(record.id.clone()),
            None => groups.push(DuplicateGroup {
                bill_id: label.to_string(),
                doc_ids: vec![record.id.clone()],
            }),
        }
    }
    groups.retain(|g| g.doc_ids.len() > 1);
    groups
}

/// One repaired bill from the duplicate fix.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateFix {
    pub doc_id: String,
    pub old_bill_id: String,
    pub new_bill_id: String,
    pub new_bill_number: i64,
    pub customer_name: String,
}

/// Narrow repair for colliding identifiers: within each duplicated
/// `billId`, the earliest holder (canonical order) keeps it; every later
/// holder is assigned a fresh number starting at one past the maximum
/// `billNumber` of all bills that are not being renumbered. Untouched
/// bills keep their numbers, so re-running on repaired data plans nothing.
pub fn plan_duplicate_fix(records: &[BillRecord]) -> Vec<DuplicateFix> {
    let groups = find_duplicates(records);

    // Every holder after the first in each group gets renumbered.
    let mut to_fix_ids: Vec<String> = Vec::new();
    for group in &groups {
        to_fix_ids.extend(group.doc_ids.iter().skip(1).cloned());
    }
    if to_fix_ids.is_empty() {
        return Vec::new();
    }

    // Max over bills keeping their numbers, so new labels cannot collide.
    let max_kept = records
        .iter()
        .filter(|r| !to_fix_ids.contains(&r.id))
        .filter_map(|r| r.bill_number)
        .max()
        .unwrap_or(0);

    let mut to_fix: Vec<BillRecord> = records
        .iter()
        .filter(|r| to_fix_ids.contains(&r.id))
        .cloned()
        .collect();
    sort_canonical(&mut to_fix);

    to_fix
        .iter()
        .enumerate()
        .map(|(offset, record)| {
            let number = max_kept + 1 + offset as i64;
            DuplicateFix {
                doc_id: record.id.clone(),
                old_bill_id: record.bill_id.clone().unwrap_or_default(),
                new_bill_id: canonicalize(number),
                new_bill_number: number,
                customer_name: record
                    .customer_name
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: &str, bill_id: Option<&str>, number: Option<i64>, day: Option<u32>) -> BillRecord {
        BillRecord {
            id: id.to_string(),
            bill_id: bill_id.map(str::to_string),
            bill_number: number,
            date: day.map(|d| Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()),
            customer_name: Some(format!("customer-{id}")),
        }
    }

    #[test]
    fn canonical_labels_pad_to_three_digits() {
        assert_eq!(canonicalize(1), "Bill001");
        assert_eq!(canonicalize(96), "Bill096");
        assert_eq!(canonicalize(999), "Bill999");
        assert_eq!(canonicalize(1000), "Bill1000");
        assert_eq!(canonicalize(12345), "Bill12345");
    }

    #[test]
    fn classify_correct_requires_matching_number() {
        assert_eq!(
            classify_bill_id(Some("Bill007"), Some(7)),
            BillIdClass::Correct
        );
        assert_eq!(
            classify_bill_id(Some("Bill1000"), Some(1000)),
            BillIdClass::Correct
        );
        // Suffix mismatch is invalid, not correct.
        assert_eq!(
            classify_bill_id(Some("Bill007"), Some(8)),
            BillIdClass::Missing
        );
    }

    #[test]
    fn classify_legacy_styles() {
        assert_eq!(classify_bill_id(Some("#42"), Some(42)), BillIdClass::HashStyle);
        assert_eq!(
            classify_bill_id(Some("1699999999999"), None),
            BillIdClass::TimestampStyle
        );
        assert_eq!(
            classify_bill_id(Some("Bill1699999999999"), Some(3)),
            BillIdClass::TimestampStyle
        );
        assert_eq!(classify_bill_id(None, Some(3)), BillIdClass::Missing);
        assert_eq!(classify_bill_id(Some("  "), None), BillIdClass::Missing);
        assert_eq!(classify_bill_id(Some("INV-3"), Some(3)), BillIdClass::Missing);
    }

    #[test]
    fn missing_dates_sort_last_and_stay_stable() {
        let mut records = vec![
            record("c", None, None, None),
            record("b", None, None, Some(2)),
            record("a", None, None, None),
            record("d", None, None, Some(1)),
        ];
        sort_canonical(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn renumbering_skips_already_canonical_bills() {
        let records = vec![
            record("a", Some("Bill001"), Some(1), Some(1)),
            record("b", Some("#2"), Some(2), Some(2)),
            record("c", None, None, Some(3)),
        ];
        let plan = plan_renumbering(&records);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].id, "b");
        assert_eq!(plan[0].new_bill_id, "Bill002");
        assert_eq!(plan[1].id, "c");
        assert_eq!(plan[1].bill_number, 3);
    }

    #[test]
    fn duplicate_fix_leaves_earliest_holder_alone() {
        // Ten bills numbered 1..10, except bills 3 and 5 swapped numbers
        // at some point and bill 7 then collided with bill 3 on Bill005.
        let mut records: Vec<BillRecord> = (1..=10)
            .map(|n| {
                record(
                    &format!("doc{n:02}"),
                    Some(canonicalize(n).as_str()),
                    Some(n),
                    Some(n as u32),
                )
            })
            .collect();
        records[2].bill_id = Some("Bill005".to_string());
        records[2].bill_number = Some(5);
        records[4].bill_id = Some("Bill003".to_string());
        records[4].bill_number = Some(3);
        records[6].bill_id = Some("Bill005".to_string());
        records[6].bill_number = Some(5);

        let fixes = plan_duplicate_fix(&records);
        assert_eq!(fixes.len(), 1);
        // doc03 is earlier by date, so doc07 is the one renumbered.
        assert_eq!(fixes[0].doc_id, "doc07");
        assert_eq!(fixes[0].old_bill_id, "Bill005");
        assert_eq!(fixes[0].new_bill_number, 11);
        assert_eq!(fixes[0].new_bill_id, "Bill011");
    }

    #[test]
    fn duplicate_fix_on_clean_data_plans_nothing() {
        let records: Vec<BillRecord> = (1..=5)
            .map(|n| {
                record(
                    &format!("doc{n}"),
                    Some(canonicalize(n).as_str()),
                    Some(n),
                    Some(n as u32),
                )
            })
            .collect();
        assert!(plan_duplicate_fix(&records).is_empty());
        assert!(find_duplicates(&records).is_empty());
    }
}
