use crate::models::amount::{lenient_amount, lenient_qty};
use crate::models::{InvoiceLineItem, NewLineItem};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Quantity and money inputs of one line. Tax is an absolute amount, not a rate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LineAmounts {
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: u32,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: BigDecimal,
}

impl From<&InvoiceLineItem> for LineAmounts {
    fn from(item: &InvoiceLineItem) -> Self {
        Self {
            qty: item.qty,
            unit_price: item.unit_price.clone(),
            tax: item.tax.clone(),
        }
    }
}

impl From<&NewLineItem> for LineAmounts {
    fn from(line: &NewLineItem) -> Self {
        Self {
            qty: line.qty,
            unit_price: line.unit_price.clone(),
            tax: line.tax.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineTotals {
    pub total_ex: BigDecimal,
    pub grand: BigDecimal,
}

pub fn calc_grand(line: &LineAmounts) -> LineTotals {
    let total_ex = BigDecimal::from(line.qty) * &line.unit_price;
    let grand = &total_ex + &line.tax;
    LineTotals { total_ex, grand }
}
