pub mod bill;
pub mod customer;
pub mod datetime;
pub mod finance;
pub mod inventory;
pub mod order;
pub mod settings;
pub mod staff;
pub mod work_description;

pub use bill::{
    Bill, BillLineItem, BillStatus, DiscountType, LineItemKind, ListBillsFilter, PaymentEntry,
    PaymentMode,
};
pub use customer::Customer;
pub use finance::{ExpenseEntry, IncomeEntry};
pub use inventory::InventoryItem;
pub use order::{Order, OrderItem, OrderItemStatus, OrderStatus};
pub use settings::BusinessSettings;
pub use staff::{AttendanceRecord, AttendanceStatus, SalaryMode, StaffMember};
pub use work_description::WorkDescription;
