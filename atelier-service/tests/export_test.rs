//! Spreadsheet export shape and naming.

use atelier_service::models::{Bill, BillStatus, DiscountType};
use atelier_service::services::export::{
    bill_to_row, bills_export_filename, build_workbook, default_bill_columns, ColumnDef,
};
use chrono::{TimeZone, Utc};

fn sample_bill() -> Bill {
    let date = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
    Bill {
        id: "b1".to_string(),
        bill_id: "Bill042".to_string(),
        bill_number: 42,
        customer_id: None,
        customer_name: "Meera".to_string(),
        customer_phone: Some("9876543210".to_string()),
        date,
        created_at: date,
        due_date: None,
        items: Vec::new(),
        subtotal: 1200.0,
        gst_percent: 5.0,
        gst_amount: 60.0,
        discount: 0.0,
        discount_type: DiscountType::Flat,
        total_amount: 1260.0,
        paid_amount: 1260.0,
        balance: 0.0,
        status: BillStatus::Paid,
        order_id: None,
        payments: Vec::new(),
    }
}

#[test]
fn export_filename_is_day_month_year() {
    let date = Utc.with_ymd_and_hms(2024, 6, 5, 23, 59, 0).unwrap();
    assert_eq!(bills_export_filename(date), "bills_05-06-2024.xlsx");
}

#[test]
fn bill_rows_carry_the_display_fields() {
    let row = bill_to_row(&sample_bill());
    assert_eq!(row["billId"], "Bill042");
    assert_eq!(row["date"], "15-06-2024");
    assert_eq!(row["customerName"], "Meera");
    assert_eq!(row["totalAmount"], 1260.0);
    assert_eq!(row["status"], "paid");
}

#[test]
fn workbook_renders_rows_under_enabled_columns() {
    let rows = vec![bill_to_row(&sample_bill())];
    let bytes = build_workbook(&rows, &default_bill_columns()).unwrap();
    assert!(bytes.len() > 500);
    assert_eq!(&bytes[0..2], b"PK");
}

#[test]
fn disabled_columns_are_dropped() {
    let rows = vec![bill_to_row(&sample_bill())];
    let narrow = vec![
        ColumnDef::new("Bill ID", "billId", 12.0),
        ColumnDef {
            enabled: false,
            ..ColumnDef::new("Customer", "customerName", 24.0)
        },
    ];
    // Still a valid workbook with only the enabled column present.
    let bytes = build_workbook(&rows, &narrow).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
}
