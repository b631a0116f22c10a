//! Bill construction rules: totals, derivation, and line-item shape.

use atelier_service::models::{
    Bill, BillLineItem, BillStatus, DiscountType, LineItemKind, PaymentEntry, PaymentMode,
};
use atelier_service::services::billing::{
    apply_payment, compute_totals, derive_balance_and_status, next_bill_number,
    normalize_line_items,
};
use chrono::{TimeZone, Utc};

fn leaf(id: &str, quantity: f64, rate: f64, cost: f64) -> BillLineItem {
    BillLineItem {
        id: id.to_string(),
        kind: LineItemKind::Service,
        source_id: None,
        description: format!("work-{id}"),
        quantity,
        rate,
        cost,
        amount: 0.0,
        sub_items: Vec::new(),
        parent_id: None,
    }
}

#[test]
fn balance_and_status_follow_payments() {
    assert_eq!(
        derive_balance_and_status(1000.0, 400.0),
        (600.0, BillStatus::Partial)
    );
    assert_eq!(
        derive_balance_and_status(1000.0, 1000.0),
        (0.0, BillStatus::Paid)
    );
    assert_eq!(
        derive_balance_and_status(1000.0, 0.0),
        (1000.0, BillStatus::Unpaid)
    );
}

#[test]
fn parent_amount_is_the_sum_of_sub_items() {
    let mut parent = leaf("blouse", 5.0, 80.0, 40.0);
    parent.sub_items = vec![leaf("lining", 1.0, 150.0, 90.0), leaf("piping", 1.0, 250.0, 110.0)];

    let items = normalize_line_items(vec![parent]).unwrap();
    // 150 + 250, regardless of the parent's own quantity and rate.
    assert_eq!(items[0].amount, 400.0);
}

#[test]
fn totals_flow_into_a_new_bill() {
    let items = normalize_line_items(vec![leaf("a", 3.0, 100.0, 60.0)]).unwrap();
    let totals = compute_totals(&items, 0.0, 0.0, DiscountType::Flat);
    assert_eq!(totals.subtotal, 300.0);
    assert_eq!(totals.total_amount, 300.0);

    let flat = compute_totals(&items, 0.0, 50.0, DiscountType::Flat);
    assert_eq!(flat.total_amount, 250.0);

    let percent = compute_totals(&items, 18.0, 0.0, DiscountType::Percent);
    assert!((percent.gst_amount - 54.0).abs() < 1e-9);
    assert!((percent.total_amount - 354.0).abs() < 1e-9);
}

#[test]
fn payments_accumulate_and_rederive_status() {
    let date = Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap();
    let items = normalize_line_items(vec![leaf("a", 1.0, 1000.0, 400.0)]).unwrap();
    let totals = compute_totals(&items, 0.0, 0.0, DiscountType::Flat);
    let (balance, status) = derive_balance_and_status(totals.total_amount, 0.0);

    let mut bill = Bill {
        id: "b1".to_string(),
        bill_id: "Bill001".to_string(),
        bill_number: 1,
        customer_id: None,
        customer_name: "Asha".to_string(),
        customer_phone: None,
        date,
        created_at: date,
        due_date: None,
        items,
        subtotal: totals.subtotal,
        gst_percent: 0.0,
        gst_amount: totals.gst_amount,
        discount: 0.0,
        discount_type: DiscountType::Flat,
        total_amount: totals.total_amount,
        paid_amount: 0.0,
        balance,
        status,
        order_id: None,
        payments: Vec::new(),
    };
    assert_eq!(bill.status, BillStatus::Unpaid);

    apply_payment(
        &mut bill,
        PaymentEntry {
            id: "p1".to_string(),
            amount: 400.0,
            mode: PaymentMode::Cash,
            date,
            note: None,
            screenshot_url: None,
        },
    );
    assert_eq!(bill.balance, 600.0);
    assert_eq!(bill.status, BillStatus::Partial);

    apply_payment(
        &mut bill,
        PaymentEntry {
            id: "p2".to_string(),
            amount: 600.0,
            mode: PaymentMode::Upi,
            date,
            note: Some("gpay".to_string()),
            screenshot_url: None,
        },
    );
    assert_eq!(bill.balance, 0.0);
    assert_eq!(bill.status, BillStatus::Paid);
    assert_eq!(bill.payments.len(), 2);
}

#[test]
fn numbers_allocate_past_the_maximum_even_after_deletes() {
    // Bill 5 was deleted; the next bill is still 8, not 5.
    assert_eq!(next_bill_number(Some(7)), 8);
    assert_eq!(next_bill_number(None), 1);
}
