use serde::{Deserialize, Serialize};

/// Service-catalog entry: a named piece of tailoring work with its
/// customer rate and internal cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkDescription {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub category: String,
    pub rate: f64,
    pub cost: f64,
}
