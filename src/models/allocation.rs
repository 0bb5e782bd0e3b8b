use super::amount::lenient_amount;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A serial handed out to a user. References the serial by value only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: String,
    pub dt: DateTime<Utc>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationRequest {
    pub user_name: String,
    pub serial: String,
    /// Optional cross-check against the line item owning the serial
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub model_name: String,
}

/// A serial retired for good
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrappedRecord {
    pub id: String,
    pub dt: DateTime<Utc>,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapRequest {
    pub serial: String,
    #[serde(default)]
    pub comment: String,
}
