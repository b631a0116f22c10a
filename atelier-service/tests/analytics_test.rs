//! ROI and income/expense aggregation over in-memory datasets.

use atelier_service::models::{
    AttendanceRecord, AttendanceStatus, Bill, BillLineItem, BillStatus, DiscountType, ExpenseEntry,
    IncomeEntry, LineItemKind, SalaryMode, StaffMember,
};
use atelier_service::services::analytics::{
    entity_roi, monthly_summary, period_roi, EntityCatalog, RoiWindow, Trend,
};
use chrono::{DateTime, TimeZone, Utc};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 11, 0, 0).unwrap()
}

fn item(kind: LineItemKind, source: &str, quantity: f64, rate: f64, cost: f64) -> BillLineItem {
    BillLineItem {
        id: format!("li-{source}-{quantity}"),
        kind,
        source_id: Some(source.to_string()),
        description: source.to_string(),
        quantity,
        rate,
        cost,
        amount: quantity * rate,
        sub_items: Vec::new(),
        parent_id: None,
    }
}

fn bill(id: &str, date: DateTime<Utc>, items: Vec<BillLineItem>) -> Bill {
    let subtotal: f64 = items.iter().map(|i| i.amount).sum();
    Bill {
        id: id.to_string(),
        bill_id: format!("Bill{id}"),
        bill_number: 1,
        customer_id: None,
        customer_name: "Asha".to_string(),
        customer_phone: None,
        date,
        created_at: date,
        due_date: None,
        items,
        subtotal,
        gst_percent: 0.0,
        gst_amount: 0.0,
        discount: 0.0,
        discount_type: DiscountType::Flat,
        total_amount: subtotal,
        paid_amount: subtotal,
        balance: 0.0,
        status: BillStatus::Paid,
        order_id: None,
        payments: Vec::new(),
    }
}

#[test]
fn entity_roi_matches_the_worked_example() {
    // One bill, one inventory line: qty 3 at rate 100, cost 60.
    let bills = vec![bill(
        "001",
        day(5),
        vec![item(LineItemKind::Inventory, "X", 3.0, 100.0, 60.0)],
    )];
    let catalog = EntityCatalog::default();

    let roi = entity_roi(
        &bills,
        LineItemKind::Inventory,
        "X",
        &RoiWindow::default(),
        &catalog,
    );

    assert_eq!(roi.total_income, 300.0);
    assert_eq!(roi.total_cost, 180.0);
    assert_eq!(roi.net_profit, 120.0);
    assert!((roi.roi_percentage - 66.666_666_666_666_67).abs() < 1e-9);
    assert_eq!(roi.item_count, 1);
    assert_eq!(roi.avg_profit, 120.0);
}

#[test]
fn zero_cost_entity_reports_zero_roi() {
    let bills = vec![bill(
        "001",
        day(5),
        vec![item(LineItemKind::Service, "stitch", 1.0, 500.0, 0.0)],
    )];
    let catalog = EntityCatalog::default();

    let roi = entity_roi(
        &bills,
        LineItemKind::Service,
        "stitch",
        &RoiWindow::default(),
        &catalog,
    );

    assert_eq!(roi.total_cost, 0.0);
    assert_eq!(roi.roi_percentage, 0.0);
    assert!(roi.roi_percentage.is_finite());
}

#[test]
fn window_filters_by_bill_date_inclusive() {
    let bills = vec![
        bill("in", day(10), vec![item(LineItemKind::Staff, "s1", 1.0, 100.0, 50.0)]),
        bill("out", day(20), vec![item(LineItemKind::Staff, "s1", 1.0, 100.0, 50.0)]),
    ];
    let catalog = EntityCatalog::default();
    let window = RoiWindow {
        start: Some(day(1)),
        end: Some(day(10)),
    };

    let roi = entity_roi(&bills, LineItemKind::Staff, "s1", &window, &catalog);
    assert_eq!(roi.item_count, 1);
    assert_eq!(roi.total_income, 100.0);
}

#[test]
fn unknown_entities_get_a_placeholder_not_an_error() {
    let bills = vec![bill(
        "001",
        day(5),
        vec![item(LineItemKind::Staff, "deleted-staff", 1.0, 200.0, 100.0)],
    )];
    let catalog = EntityCatalog::default();

    let roi = entity_roi(
        &bills,
        LineItemKind::Staff,
        "deleted-staff",
        &RoiWindow::default(),
        &catalog,
    );
    assert_eq!(roi.name, "Unknown");
    assert_eq!(roi.total_income, 200.0);
}

#[test]
fn period_roi_ranks_entities_by_roi_descending() {
    let bills = vec![bill(
        "001",
        day(5),
        vec![
            // 100% ROI
            item(LineItemKind::Inventory, "silk", 1.0, 200.0, 100.0),
            // 25% ROI
            item(LineItemKind::Inventory, "buttons", 1.0, 125.0, 100.0),
            // 300% ROI
            item(LineItemKind::Inventory, "lace", 1.0, 400.0, 100.0),
        ],
    )];
    let mut catalog = EntityCatalog::default();
    catalog.insert(LineItemKind::Inventory, "silk", "Silk", "fabric");
    catalog.insert(LineItemKind::Inventory, "buttons", "Buttons", "notions");
    catalog.insert(LineItemKind::Inventory, "lace", "Lace", "fabric");

    let window = RoiWindow {
        start: Some(day(1)),
        end: Some(day(28)),
    };
    let period = period_roi(&bills, &window, &catalog);

    let order: Vec<&str> = period
        .inventory
        .iter()
        .map(|e| e.entity_id.as_str())
        .collect();
    assert_eq!(order, vec!["lace", "silk", "buttons"]);

    assert_eq!(period.total_income, 725.0);
    assert_eq!(period.total_cost, 300.0);
}

#[test]
fn period_income_uses_bill_totals_not_line_sums() {
    // A bill with GST: totalAmount exceeds the line-item sum.
    let mut b = bill(
        "001",
        day(5),
        vec![item(LineItemKind::Service, "stitch", 1.0, 1000.0, 400.0)],
    );
    b.gst_percent = 5.0;
    b.gst_amount = 50.0;
    b.total_amount = 1050.0;

    let window = RoiWindow {
        start: Some(day(1)),
        end: Some(day(28)),
    };
    let period = period_roi(&[b], &window, &EntityCatalog::default());
    assert_eq!(period.total_income, 1050.0);
}

fn staff_member(id: &str, mode: SalaryMode, amount: f64) -> StaffMember {
    StaffMember {
        id: id.to_string(),
        name: format!("staff-{id}"),
        role: "tailor".to_string(),
        phone: None,
        billing_rate: 0.0,
        cost_rate: 0.0,
        salary_mode: mode,
        salary_amount: amount,
        active: true,
        joined_at: day(1),
    }
}

fn confirmed(staff_id: &str, d: u32, hours: Option<f64>) -> AttendanceRecord {
    AttendanceRecord {
        id: format!("att-{staff_id}-{d}"),
        staff_id: staff_id.to_string(),
        date: day(d),
        status: AttendanceStatus::Confirmed,
        hours_worked: hours,
    }
}

#[test]
fn monthly_summary_accrues_salaries_by_mode() {
    let bills = vec![bill(
        "001",
        day(5),
        vec![item(LineItemKind::Service, "stitch", 1.0, 10_000.0, 2_000.0)],
    )];
    let incomes = vec![IncomeEntry {
        id: "inc1".to_string(),
        date: day(6),
        amount: 500.0,
        category: "alteration".to_string(),
        note: None,
    }];
    let expenses = vec![ExpenseEntry {
        id: "exp1".to_string(),
        date: day(7),
        amount: 1_000.0,
        category: "rent".to_string(),
        note: None,
    }];
    let staff = vec![
        staff_member("m", SalaryMode::Monthly, 6_000.0),
        staff_member("d", SalaryMode::Daily, 300.0),
        staff_member("h", SalaryMode::Hourly, 50.0),
    ];
    let attendance = vec![
        // Daily: two confirmed days -> 600.
        confirmed("d", 4, None),
        confirmed("d", 5, None),
        // Hourly: 6 recorded hours + one default 8-hour day -> 700.
        confirmed("h", 4, Some(6.0)),
        confirmed("h", 5, None),
        // Absences never accrue.
        AttendanceRecord {
            id: "att-d-6".to_string(),
            staff_id: "d".to_string(),
            date: day(6),
            status: AttendanceStatus::Absent,
            hours_worked: None,
        },
    ];

    let summary = monthly_summary(&bills, &incomes, &expenses, &staff, &attendance, 2024, 3);

    assert_eq!(summary.billed_income, 10_000.0);
    assert_eq!(summary.manual_income, 500.0);
    assert_eq!(summary.total_income, 10_500.0);
    assert_eq!(summary.cost_of_goods, 2_000.0);
    assert_eq!(summary.manual_expenses, 1_000.0);
    assert_eq!(summary.accrued_salaries, 6_000.0 + 600.0 + 700.0);
    assert_eq!(summary.total_expenses, 2_000.0 + 1_000.0 + 7_300.0);
    assert_eq!(summary.net_profit, 10_500.0 - 10_300.0);
}

#[test]
fn trend_thresholds_are_fixed() {
    // Margin well above 15% trends up.
    let rich = monthly_summary(
        &[bill(
            "001",
            day(5),
            vec![item(LineItemKind::Service, "stitch", 1.0, 10_000.0, 1_000.0)],
        )],
        &[],
        &[],
        &[],
        &[],
        2024,
        3,
    );
    assert_eq!(rich.trend, Trend::Up);

    // Spending more than income trends down.
    let poor = monthly_summary(
        &[bill(
            "002",
            day(5),
            vec![item(LineItemKind::Service, "stitch", 1.0, 1_000.0, 2_000.0)],
        )],
        &[],
        &[],
        &[],
        &[],
        2024,
        3,
    );
    assert_eq!(poor.trend, Trend::Down);

    // An empty month has zero margin and stays neutral.
    let idle = monthly_summary(&[], &[], &[], &[], &[], 2024, 3);
    assert_eq!(idle.total_income, 0.0);
    assert_eq!(idle.profit_margin, 0.0);
    assert_eq!(idle.trend, Trend::Neutral);
}
