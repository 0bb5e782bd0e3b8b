use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Coerces a JSON value to a money amount.
/// Numbers and numeric strings are accepted; negative or non-numeric input becomes zero.
pub fn coerce_amount(value: &Value) -> BigDecimal {
    let parsed = match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    };

    match parsed {
        Some(amount) if amount > BigDecimal::zero() => amount,
        _ => BigDecimal::zero(),
    }
}

/// Coerces a JSON value to a unit quantity. Fractions are truncated.
pub fn coerce_qty(value: &Value) -> u32 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(qty) if qty.is_finite() && qty >= 1.0 => qty.min(f64::from(u32::MAX)).trunc() as u32,
        _ => 0,
    }
}

pub fn lenient_amount<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}

pub fn lenient_qty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_qty(&value))
}
