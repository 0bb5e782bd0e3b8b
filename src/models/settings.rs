use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CREDIT_DAYS_KEY: &str = "creditDays";
pub const SERIAL_PATTERN_KEY: &str = "serialPattern";

/// Raw key-value row of the settings collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Effective settings after defaults are applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub credit_days: i64,
    pub serial_pattern: String,
}
