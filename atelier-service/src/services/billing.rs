//! Bill construction rules: line-item normalization, totals, and the
//! balance/status derivation.

use atelier_core::error::AppError;
use serde::Serialize;

use crate::models::{Bill, BillLineItem, BillStatus, DiscountType, PaymentEntry};

/// Normalize line items before a bill is persisted.
///
/// Enforces the one-level nesting constraint, recomputes leaf amounts as
/// `quantity * rate`, stamps `parentId` on sub-items, and recomputes a
/// parent's amount as the sum of its sub-items (its own quantity and rate
/// are ignored).
pub fn normalize_line_items(mut items: Vec<BillLineItem>) -> Result<Vec<BillLineItem>, AppError> {
    for item in &mut items {
        if item.sub_items.is_empty() {
            item.amount = item.quantity * item.rate;
            continue;
        }
        for sub in &mut item.sub_items {
            if !sub.sub_items.is_empty() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "line item '{}' nests sub-items more than one level deep",
                    item.description
                )));
            }
            sub.amount = sub.quantity * sub.rate;
            sub.parent_id = Some(item.id.clone());
        }
        item.amount = item.sub_items.iter().map(|sub| sub.amount).sum();
    }
    Ok(items)
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillTotals {
    pub subtotal: f64,
    pub gst_amount: f64,
    pub total_amount: f64,
}

/// Subtotal over top-level amounts, discount (flat or percent of
/// subtotal), then GST on the discounted base.
pub fn compute_totals(
    items: &[BillLineItem],
    gst_percent: f64,
    discount: f64,
    discount_type: DiscountType,
) -> BillTotals {
    let subtotal: f64 = items.iter().map(|item| item.amount).sum();
    let discount_amount = match discount_type {
        DiscountType::Flat => discount,
        DiscountType::Percent => subtotal * discount / 100.0,
    };
    let taxable = subtotal - discount_amount;
    let gst_amount = taxable * gst_percent / 100.0;
    BillTotals {
        subtotal,
        gst_amount,
        total_amount: taxable + gst_amount,
    }
}

/// Balance and status from the total and what has been paid. The balance
/// may go negative on overpayment and is reported as-is.
pub fn derive_balance_and_status(total_amount: f64, paid_amount: f64) -> (f64, BillStatus) {
    let balance = total_amount - paid_amount;
    let status = if paid_amount <= 0.0 && total_amount > 0.0 {
        BillStatus::Unpaid
    } else if balance <= 0.0 {
        BillStatus::Paid
    } else {
        BillStatus::Partial
    };
    (balance, status)
}

/// The next sequence number for a new bill: one past the current maximum.
/// Deleting a bill never reuses its number.
pub fn next_bill_number(current_max: Option<i64>) -> i64 {
    current_max.unwrap_or(0) + 1
}

/// Record a payment against a bill and re-derive balance and status.
pub fn apply_payment(bill: &mut Bill, entry: PaymentEntry) {
    bill.paid_amount += entry.amount;
    let (balance, status) = derive_balance_and_status(bill.total_amount, bill.paid_amount);
    bill.balance = balance;
    bill.status = status;
    bill.payments.push(entry);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineItemKind;

    fn leaf(id: &str, quantity: f64, rate: f64, cost: f64) -> BillLineItem {
        BillLineItem {
            id: id.to_string(),
            kind: LineItemKind::Service,
            source_id: None,
            description: format!("item-{id}"),
            quantity,
            rate,
            cost,
            amount: 0.0,
            sub_items: Vec::new(),
            parent_id: None,
        }
    }

    #[test]
    fn leaf_amount_is_quantity_times_rate() {
        let items = normalize_line_items(vec![leaf("a", 3.0, 100.0, 60.0)]).unwrap();
        assert_eq!(items[0].amount, 300.0);
    }

    #[test]
    fn parent_amount_sums_sub_items_and_ignores_own_pricing() {
        let mut parent = leaf("p", 99.0, 999.0, 0.0);
        parent.sub_items = vec![leaf("s1", 1.0, 150.0, 80.0), leaf("s2", 1.0, 250.0, 120.0)];
        let items = normalize_line_items(vec![parent]).unwrap();
        assert_eq!(items[0].amount, 400.0);
        assert_eq!(items[0].sub_items[0].parent_id.as_deref(), Some("p"));
    }

    #[test]
    fn deeper_nesting_is_rejected() {
        let mut grandchild = leaf("g", 1.0, 10.0, 5.0);
        grandchild.sub_items = vec![leaf("gg", 1.0, 1.0, 1.0)];
        let mut parent = leaf("p", 1.0, 0.0, 0.0);
        parent.sub_items = vec![grandchild];
        assert!(normalize_line_items(vec![parent]).is_err());
    }

    #[test]
    fn status_derivation_matches_payment_states() {
        let (balance, status) = derive_balance_and_status(1000.0, 400.0);
        assert_eq!(balance, 600.0);
        assert_eq!(status, BillStatus::Partial);

        let (balance, status) = derive_balance_and_status(1000.0, 1000.0);
        assert_eq!(balance, 0.0);
        assert_eq!(status, BillStatus::Paid);

        let (balance, status) = derive_balance_and_status(1000.0, 0.0);
        assert_eq!(balance, 1000.0);
        assert_eq!(status, BillStatus::Unpaid);

        // Overpayment surfaces as a negative balance on a paid bill.
        let (balance, status) = derive_balance_and_status(1000.0, 1200.0);
        assert_eq!(balance, -200.0);
        assert_eq!(status, BillStatus::Paid);
    }

    #[test]
    fn totals_apply_discount_before_gst() {
        let items = normalize_line_items(vec![leaf("a", 2.0, 500.0, 300.0)]).unwrap();
        let totals = compute_totals(&items, 5.0, 10.0, DiscountType::Percent);
        assert_eq!(totals.subtotal, 1000.0);
        // 10% discount -> 900 taxable, 5% GST -> 45.
        assert!((totals.gst_amount - 45.0).abs() < 1e-9);
        assert!((totals.total_amount - 945.0).abs() < 1e-9);
    }

    #[test]
    fn sequence_numbers_never_reuse() {
        assert_eq!(next_bill_number(None), 1);
        assert_eq!(next_bill_number(Some(96)), 97);
    }
}
