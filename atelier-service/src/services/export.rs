//! Spreadsheet export: turn rows plus column definitions into an xlsx
//! workbook.

use atelier_core::error::AppError;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value;

use crate::models::Bill;

/// One exported column: a header title, the row key it reads, its width,
/// and whether it is currently enabled.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub title: String,
    pub key: String,
    pub width: f64,
    pub enabled: bool,
}

impl ColumnDef {
    pub fn new(title: &str, key: &str, width: f64) -> Self {
        Self {
            title: title.to_string(),
            key: key.to_string(),
            width,
            enabled: true,
        }
    }
}

/// Export file name for a bills workbook: `bills_<DD-MM-YYYY>.xlsx`.
pub fn bills_export_filename(date: DateTime<Utc>) -> String {
    format!("bills_{}.xlsx", date.format("%d-%m-%Y"))
}

/// The default bill export layout.
pub fn default_bill_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("Bill ID", "billId", 12.0),
        ColumnDef::new("Date", "date", 14.0),
        ColumnDef::new("Customer", "customerName", 24.0),
        ColumnDef::new("Phone", "customerPhone", 16.0),
        ColumnDef::new("Subtotal", "subtotal", 12.0),
        ColumnDef::new("GST", "gstAmount", 10.0),
        ColumnDef::new("Discount", "discount", 10.0),
        ColumnDef::new("Total", "totalAmount", 12.0),
        ColumnDef::new("Paid", "paidAmount", 12.0),
        ColumnDef::new("Balance", "balance", 12.0),
        ColumnDef::new("Status", "status", 10.0),
    ]
}

/// Flatten a bill into the key/value row shape the exporter reads.
pub fn bill_to_row(bill: &Bill) -> Value {
    serde_json::json!({
        "billId": bill.bill_id,
        "date": bill.date.format("%d-%m-%Y").to_string(),
        "customerName": bill.customer_name,
        "customerPhone": bill.customer_phone.clone().unwrap_or_default(),
        "subtotal": bill.subtotal,
        "gstAmount": bill.gst_amount,
        "discount": bill.discount,
        "totalAmount": bill.total_amount,
        "paidAmount": bill.paid_amount,
        "balance": bill.balance,
        "status": bill.status.to_string(),
    })
}

/// Build a workbook from rows and enabled columns, returned as bytes for
/// the HTTP download response.
pub fn build_workbook(rows: &[Value], columns: &[ColumnDef]) -> Result<Vec<u8>, AppError> {
    let enabled: Vec<&ColumnDef> = columns.iter().filter(|c| c.enabled).collect();

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Bills")
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("xlsx error: {e}")))?;

    let header_format = Format::new().set_bold();
    for (col, column) in enabled.iter().enumerate() {
        let col = col as u16;
        worksheet
            .set_column_width(col, column.width)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("xlsx error: {e}")))?;
        worksheet
            .write_string_with_format(0, col, column.title.as_str(), &header_format)
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("xlsx error: {e}")))?;
    }

    for (row_index, row) in rows.iter().enumerate() {
        let row_num = (row_index + 1) as u32;
        for (col, column) in enabled.iter().enumerate() {
            let col = col as u16;
            let write_result = match row.get(&column.key) {
                Some(Value::Number(n)) => {
                    worksheet.write_number(row_num, col, n.as_f64().unwrap_or(0.0))
                }
                Some(Value::String(s)) => worksheet.write_string(row_num, col, s.as_str()),
                Some(Value::Bool(b)) => worksheet.write_string(
                    row_num,
                    col,
                    if *b { "yes" } else { "no" },
                ),
                Some(Value::Null) | None => continue,
                Some(other) => worksheet.write_string(row_num, col, other.to_string()),
            };
            write_result
                .map_err(|e| AppError::InternalError(anyhow::anyhow!("xlsx error: {e}")))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("xlsx error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filename_uses_day_month_year() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 10, 0, 0).unwrap();
        assert_eq!(bills_export_filename(date), "bills_07-03-2024.xlsx");
    }

    #[test]
    fn workbook_builds_with_disabled_columns_removed() {
        let mut columns = default_bill_columns();
        columns[3].enabled = false;
        let rows = vec![serde_json::json!({
            "billId": "Bill001",
            "date": "01-01-2024",
            "customerName": "Asha",
            "subtotal": 1000.0,
            "totalAmount": 1050.0,
            "status": "paid",
        })];
        let bytes = build_workbook(&rows, &columns).unwrap();
        // xlsx files are zip archives; check the magic header.
        assert_eq!(&bytes[0..2], b"PK");
    }
}
