//! Renumbering and duplicate-repair behavior over in-memory bill records.

use atelier_service::services::numbering::{
    canonicalize, classify_bill_id, plan_duplicate_fix, plan_renumbering, BillIdClass, BillRecord,
};
use chrono::{DateTime, TimeZone, Utc};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 9, 30, 0).unwrap()
}

fn record(id: &str, bill_id: Option<&str>, number: Option<i64>, date: Option<DateTime<Utc>>) -> BillRecord {
    BillRecord {
        id: id.to_string(),
        bill_id: bill_id.map(str::to_string),
        bill_number: number,
        date,
        customer_name: Some("Asha".to_string()),
    }
}

fn messy_dataset() -> Vec<BillRecord> {
    vec![
        record("docA", Some("#3"), Some(3), Some(day(5))),
        record("docB", Some("Bill001"), Some(1), Some(day(1))),
        record("docC", Some("1699999999999"), None, Some(day(3))),
        record("docD", None, None, None),
        record("docE", Some("Bill002"), Some(2), Some(day(2))),
    ]
}

#[test]
fn preview_is_deterministic() {
    let records = messy_dataset();
    let first = plan_renumbering(&records);
    let second = plan_renumbering(&records);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.new_bill_id, b.new_bill_id);
        assert_eq!(a.bill_number, b.bill_number);
    }
}

#[test]
fn executing_the_plan_makes_the_next_preview_empty() {
    let mut records = messy_dataset();
    let plan = plan_renumbering(&records);

    for change in &plan {
        let record = records.iter_mut().find(|r| r.id == change.id).unwrap();
        record.bill_id = Some(change.new_bill_id.clone());
        record.bill_number = Some(change.bill_number);
    }

    assert!(plan_renumbering(&records).is_empty());
}

#[test]
fn renumbering_is_dense_and_unique() {
    let mut records = messy_dataset();
    let plan = plan_renumbering(&records);
    for change in &plan {
        let record = records.iter_mut().find(|r| r.id == change.id).unwrap();
        record.bill_id = Some(change.new_bill_id.clone());
        record.bill_number = Some(change.bill_number);
    }

    let mut numbers: Vec<i64> = records.iter().map(|r| r.bill_number.unwrap()).collect();
    numbers.sort_unstable();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
}

#[test]
fn date_order_is_preserved() {
    let mut records = messy_dataset();
    let plan = plan_renumbering(&records);
    for change in &plan {
        let record = records.iter_mut().find(|r| r.id == change.id).unwrap();
        record.bill_id = Some(change.new_bill_id.clone());
        record.bill_number = Some(change.bill_number);
    }

    for a in &records {
        for b in &records {
            if let (Some(da), Some(db)) = (a.date, b.date) {
                if da < db {
                    assert!(
                        a.bill_number.unwrap() < b.bill_number.unwrap(),
                        "{} ({da}) should be numbered before {} ({db})",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    // The dateless bill lands at the end of the sequence.
    let dateless = records.iter().find(|r| r.date.is_none()).unwrap();
    assert_eq!(dateless.bill_number, Some(5));
}

#[test]
fn same_date_ties_break_by_document_id() {
    let tied = vec![
        record("zz", None, None, Some(day(1))),
        record("aa", None, None, Some(day(1))),
    ];
    let plan = plan_renumbering(&tied);
    let aa = plan.iter().find(|c| c.id == "aa").unwrap();
    let zz = plan.iter().find(|c| c.id == "zz").unwrap();
    assert_eq!(aa.bill_number, 1);
    assert_eq!(zz.bill_number, 2);
}

#[test]
fn duplicate_fix_renumbers_only_the_colliding_bills() {
    // Ten bills: 3 and 5 swapped numbers historically, and 7 collided
    // with 3 on Bill005. Exactly one document needs repair.
    let mut records: Vec<BillRecord> = (1..=10)
        .map(|n| {
            record(
                &format!("doc{n:02}"),
                Some(canonicalize(n).as_str()),
                Some(n),
                Some(day(n as u32)),
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
    assert_eq!(fixes[0].doc_id, "doc07");
    assert_eq!(fixes[0].new_bill_number, 11);
    assert_eq!(fixes[0].new_bill_id, "Bill011");

    // Everything that was not part of the collision is untouched.
    let touched: Vec<&str> = fixes.iter().map(|f| f.doc_id.as_str()).collect();
    for n in [1, 2, 4, 5, 6, 8, 9, 10] {
        assert!(!touched.contains(&format!("doc{n:02}").as_str()));
    }
}

#[test]
fn duplicate_fix_orders_later_holders_by_date() {
    let records = vec![
        record("k1", Some("Bill001"), Some(1), Some(day(1))),
        record("k2", Some("Bill002"), Some(2), Some(day(2))),
        record("d1", Some("Bill096"), Some(96), Some(day(10))),
        record("d2", Some("Bill096"), Some(96), Some(day(12))),
        record("d3", Some("Bill096"), Some(96), Some(day(11))),
    ];
    let fixes = plan_duplicate_fix(&records);

    // d1 keeps Bill096; d3 then d2 by date ascending.
    assert_eq!(fixes.len(), 2);
    assert_eq!(fixes[0].doc_id, "d3");
    assert_eq!(fixes[0].new_bill_number, 97);
    assert_eq!(fixes[1].doc_id, "d2");
    assert_eq!(fixes[1].new_bill_number, 98);
}

#[test]
fn classification_is_pure_and_closed() {
    assert_eq!(classify_bill_id(Some("Bill096"), Some(96)), BillIdClass::Correct);
    assert_eq!(classify_bill_id(Some("#96"), Some(96)), BillIdClass::HashStyle);
    assert_eq!(
        classify_bill_id(Some("1700000000000"), Some(96)),
        BillIdClass::TimestampStyle
    );
    assert_eq!(classify_bill_id(None, None), BillIdClass::Missing);
}
