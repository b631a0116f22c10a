//! MongoDB access for the atelier backend: connection, indexes, and the
//! per-collection read/write helpers the handlers use.

use atelier_core::error::AppError;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::{FindOptions, IndexOptions, ReplaceOptions},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};

use crate::models::{
    AttendanceRecord, Bill, BusinessSettings, Customer, ExpenseEntry, IncomeEntry, InventoryItem,
    ListBillsFilter, Order, StaffMember, WorkDescription,
};

/// The settings collection holds a single document under a fixed key.
const SETTINGS_DOC_ID: &str = "business";

#[derive(Debug, Serialize, Deserialize)]
struct SettingsDoc {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    settings: BusinessSettings,
}

#[derive(Clone)]
pub struct AtelierDb {
    client: MongoClient,
    db: Database,
}

impl AtelierDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
        })?;
        let db = client.database(database);
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes");

        // billNumber is unique after migration but historical data may
        // still carry collisions, so the index stays non-unique and the
        // repair tooling owns uniqueness.
        let bill_number_index = IndexModel::builder()
            .keys(doc! { "billNumber": 1 })
            .options(
                IndexOptions::builder()
                    .name("bill_number_idx".to_string())
                    .build(),
            )
            .build();

        let bill_date_index = IndexModel::builder()
            .keys(doc! { "date": -1 })
            .options(
                IndexOptions::builder()
                    .name("bill_date_idx".to_string())
                    .build(),
            )
            .build();

        let bill_customer_index = IndexModel::builder()
            .keys(doc! { "customerId": 1 })
            .options(
                IndexOptions::builder()
                    .name("bill_customer_idx".to_string())
                    .sparse(true)
                    .build(),
            )
            .build();

        self.bills()
            .create_indexes([bill_number_index, bill_date_index, bill_customer_index], None)
            .await?;

        let attendance_index = IndexModel::builder()
            .keys(doc! { "staffId": 1, "date": 1 })
            .options(
                IndexOptions::builder()
                    .name("attendance_staff_date_idx".to_string())
                    .build(),
            )
            .build();
        self.attendance().create_index(attendance_index, None).await?;

        let order_created_index = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("order_created_idx".to_string())
                    .build(),
            )
            .build();
        self.orders().create_index(order_created_index, None).await?;

        tracing::info!("MongoDB indexes ready");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
            })?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------

    pub fn bills(&self) -> Collection<Bill> {
        self.db.collection("bills")
    }

    /// Raw view of the bills collection for the maintenance tooling,
    /// which must read documents the typed model would reject.
    pub fn bills_raw(&self) -> Collection<Document> {
        self.db.collection("bills")
    }

    pub fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    pub fn customers(&self) -> Collection<Customer> {
        self.db.collection("customers")
    }

    pub fn staff(&self) -> Collection<StaffMember> {
        self.db.collection("staff")
    }

    pub fn attendance(&self) -> Collection<AttendanceRecord> {
        self.db.collection("attendance")
    }

    pub fn inventory(&self) -> Collection<InventoryItem> {
        self.db.collection("inventory")
    }

    pub fn work_descriptions(&self) -> Collection<WorkDescription> {
        self.db.collection("workDescriptions")
    }

    pub fn income(&self) -> Collection<IncomeEntry> {
        self.db.collection("income")
    }

    pub fn expenses(&self) -> Collection<ExpenseEntry> {
        self.db.collection("expenses")
    }

    fn settings_collection(&self) -> Collection<SettingsDoc> {
        self.db.collection("settings")
    }

    // -------------------------------------------------------------------
    // Bills
    // -------------------------------------------------------------------

    pub async fn insert_bill(&self, bill: &Bill) -> Result<(), AppError> {
        self.bills().insert_one(bill, None).await?;
        Ok(())
    }

    pub async fn get_bill(&self, id: &str) -> Result<Option<Bill>, AppError> {
        Ok(self.bills().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn replace_bill(&self, bill: &Bill) -> Result<(), AppError> {
        self.bills()
            .replace_one(doc! { "_id": &bill.id }, bill, None)
            .await?;
        Ok(())
    }

    pub async fn delete_bill(&self, id: &str) -> Result<bool, AppError> {
        let result = self.bills().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn list_bills(&self, filter: &ListBillsFilter) -> Result<Vec<Bill>, AppError> {
        let mut query = doc! {};
        if let Some(status) = filter.status {
            query.insert("status", status.to_string());
        }
        if let Some(customer_id) = &filter.customer_id {
            query.insert("customerId", customer_id);
        }
        let mut date_range = doc! {};
        if let Some(start) = filter.start_date {
            date_range.insert("$gte", BsonDateTime::from_chrono(start));
        }
        if let Some(end) = filter.end_date {
            date_range.insert("$lte", BsonDateTime::from_chrono(end));
        }
        if !date_range.is_empty() {
            query.insert("date", date_range);
        }

        let options = FindOptions::builder().sort(doc! { "date": -1 }).build();
        let cursor = self.bills().find(query, options).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Full scan that tolerates documents the typed model cannot read
    /// (pre-repair data). Bad documents are logged and skipped so one
    /// broken bill cannot take down an aggregate view.
    pub async fn all_bills_lenient(&self) -> Result<Vec<Bill>, AppError> {
        let mut cursor = self.bills_raw().find(doc! {}, None).await?;
        let mut bills = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            match mongodb::bson::from_document::<Bill>(document) {
                Ok(bill) => bills.push(bill),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping bill that does not match the model")
                }
            }
        }
        Ok(bills)
    }

    /// Highest billNumber currently assigned, if any bill has one.
    pub async fn max_bill_number(&self) -> Result<Option<i64>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "billNumber": -1 })
            .limit(1)
            .build();
        let mut cursor = self.bills_raw().find(doc! {}, options).await?;
        if let Some(document) = cursor.try_next().await? {
            let max = document.get_i64("billNumber").ok().or_else(|| {
                document
                    .get_i32("billNumber")
                    .ok()
                    .map(|n| n as i64)
            });
            return Ok(max);
        }
        Ok(None)
    }

    // -------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------

    pub async fn insert_customer(&self, customer: &Customer) -> Result<(), AppError> {
        self.customers().insert_one(customer, None).await?;
        Ok(())
    }

    pub async fn get_customer(&self, id: &str) -> Result<Option<Customer>, AppError> {
        Ok(self.customers().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();
        let cursor = self.customers().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn replace_customer(&self, customer: &Customer) -> Result<(), AppError> {
        self.customers()
            .replace_one(doc! { "_id": &customer.id }, customer, None)
            .await?;
        Ok(())
    }

    pub async fn delete_customer(&self, id: &str) -> Result<bool, AppError> {
        let result = self.customers().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    // -------------------------------------------------------------------
    // Staff and attendance
    // -------------------------------------------------------------------

    pub async fn insert_staff(&self, member: &StaffMember) -> Result<(), AppError> {
        self.staff().insert_one(member, None).await?;
        Ok(())
    }

    pub async fn get_staff(&self, id: &str) -> Result<Option<StaffMember>, AppError> {
        Ok(self.staff().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_staff(&self) -> Result<Vec<StaffMember>, AppError> {
        let cursor = self.staff().find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn replace_staff(&self, member: &StaffMember) -> Result<(), AppError> {
        self.staff()
            .replace_one(doc! { "_id": &member.id }, member, None)
            .await?;
        Ok(())
    }

    pub async fn delete_staff(&self, id: &str) -> Result<bool, AppError> {
        let result = self.staff().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn insert_attendance(&self, record: &AttendanceRecord) -> Result<(), AppError> {
        self.attendance().insert_one(record, None).await?;
        Ok(())
    }

    pub async fn list_attendance_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let query = doc! {
            "date": {
                "$gte": BsonDateTime::from_chrono(start),
                "$lt": BsonDateTime::from_chrono(end),
            }
        };
        let cursor = self.attendance().find(query, None).await?;
        Ok(cursor.try_collect().await?)
    }

    // -------------------------------------------------------------------
    // Inventory and work descriptions
    // -------------------------------------------------------------------

    pub async fn insert_inventory(&self, item: &InventoryItem) -> Result<(), AppError> {
        self.inventory().insert_one(item, None).await?;
        Ok(())
    }

    pub async fn get_inventory(&self, id: &str) -> Result<Option<InventoryItem>, AppError> {
        Ok(self.inventory().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>, AppError> {
        let cursor = self.inventory().find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn replace_inventory(&self, item: &InventoryItem) -> Result<(), AppError> {
        self.inventory()
            .replace_one(doc! { "_id": &item.id }, item, None)
            .await?;
        Ok(())
    }

    pub async fn delete_inventory(&self, id: &str) -> Result<bool, AppError> {
        let result = self.inventory().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Adjust stock by a signed delta (restock positive, consumption
    /// negative).
    pub async fn adjust_inventory_stock(&self, id: &str, delta: f64) -> Result<(), AppError> {
        self.inventory()
            .update_one(
                doc! { "_id": id },
                doc! { "$inc": { "quantityInStock": delta } },
                None,
            )
            .await?;
        Ok(())
    }

    pub async fn insert_work_description(&self, work: &WorkDescription) -> Result<(), AppError> {
        self.work_descriptions().insert_one(work, None).await?;
        Ok(())
    }

    pub async fn list_work_descriptions(&self) -> Result<Vec<WorkDescription>, AppError> {
        let cursor = self.work_descriptions().find(doc! {}, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn delete_work_description(&self, id: &str) -> Result<bool, AppError> {
        let result = self
            .work_descriptions()
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    // -------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------

    pub async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders().insert_one(order, None).await?;
        Ok(())
    }

    pub async fn get_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders().find_one(doc! { "_id": id }, None).await?)
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1 })
            .build();
        let cursor = self.orders().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn replace_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders()
            .replace_one(doc! { "_id": &order.id }, order, None)
            .await?;
        Ok(())
    }

    pub async fn delete_order(&self, id: &str) -> Result<bool, AppError> {
        let result = self.orders().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    // -------------------------------------------------------------------
    // Manual income and expenses
    // -------------------------------------------------------------------

    pub async fn insert_income(&self, entry: &IncomeEntry) -> Result<(), AppError> {
        self.income().insert_one(entry, None).await?;
        Ok(())
    }

    pub async fn list_income_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IncomeEntry>, AppError> {
        let query = doc! {
            "date": {
                "$gte": BsonDateTime::from_chrono(start),
                "$lt": BsonDateTime::from_chrono(end),
            }
        };
        let cursor = self.income().find(query, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn delete_income(&self, id: &str) -> Result<bool, AppError> {
        let result = self.income().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn insert_expense(&self, entry: &ExpenseEntry) -> Result<(), AppError> {
        self.expenses().insert_one(entry, None).await?;
        Ok(())
    }

    pub async fn list_expenses_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ExpenseEntry>, AppError> {
        let query = doc! {
            "date": {
                "$gte": BsonDateTime::from_chrono(start),
                "$lt": BsonDateTime::from_chrono(end),
            }
        };
        let cursor = self.expenses().find(query, None).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn delete_expense(&self, id: &str) -> Result<bool, AppError> {
        let result = self.expenses().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    // -------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------

    /// Business settings, falling back to defaults when the document has
    /// never been written.
    pub async fn get_settings(&self) -> Result<BusinessSettings, AppError> {
        let found = self
            .settings_collection()
            .find_one(doc! { "_id": SETTINGS_DOC_ID }, None)
            .await?;
        Ok(found
            .map(|doc| doc.settings)
            .unwrap_or_default())
    }

    pub async fn update_settings(&self, settings: &BusinessSettings) -> Result<(), AppError> {
        let doc = SettingsDoc {
            id: SETTINGS_DOC_ID.to_string(),
            settings: settings.clone(),
        };
        let options = ReplaceOptions::builder().upsert(true).build();
        self.settings_collection()
            .replace_one(doc! { "_id": SETTINGS_DOC_ID }, &doc, options)
            .await?;
        Ok(())
    }
}
