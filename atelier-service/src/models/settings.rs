use serde::{Deserialize, Serialize};

/// Shop-wide business settings, stored as a single document in the
/// `settings` collection. Read once per operation and passed in
/// explicitly; never held as ambient global state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    pub business_name: String,
    /// Payee VPA for UPI payment links.
    pub upi_id: String,
    /// Country calling code prefixed to local phone numbers, digits only.
    pub country_code: String,
    /// Markup applied to inventory items without an explicit selling
    /// price.
    pub default_markup_multiplier: f64,
    pub gst_percent: f64,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            business_name: "Atelier".to_string(),
            upi_id: String::new(),
            country_code: "91".to_string(),
            default_markup_multiplier: 1.25,
            gst_percent: 0.0,
        }
    }
}
