use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    /// Stocking unit, e.g. "meter", "piece".
    pub unit: String,
    pub quantity_in_stock: f64,
    pub cost_per_unit: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selling_price: Option<f64>,
}

impl InventoryItem {
    /// Price charged when the item is billed. Items without an explicit
    /// selling price fall back to cost plus the configured markup.
    pub fn effective_selling_price(&self, default_markup_multiplier: f64) -> f64 {
        self.selling_price
            .unwrap_or(self.cost_per_unit * default_markup_multiplier)
    }
}
