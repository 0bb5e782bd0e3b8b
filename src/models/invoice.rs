use super::amount::{lenient_amount, lenient_qty};
use super::serial::SerialStatusRow;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Supplier invoice header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub grand_total: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// One invoice row. `serials` is filled once at creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: String,
    pub invoice_id: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: u32,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: BigDecimal,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub serials: Vec<String>,
}

/// Request body for a new invoice
#[derive(Debug, Clone, Deserialize)]
pub struct NewInvoice {
    pub date: NaiveDate,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub lines: Vec<NewLineItem>,
}

/// Line of a new invoice. Manual serials are optional; missing ones are generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLineItem {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: u32,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: BigDecimal,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub serials: Vec<String>,
}

/// Invoice with its lines and the derived status of every serial on it
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceLineItem>,
    pub serials: Vec<SerialStatusRow>,
}

/// Row counts removed by an invoice delete
#[derive(Debug, Clone, Serialize)]
pub struct DeletedInvoice {
    pub invoice_id: String,
    pub line_items: usize,
    pub payments: usize,
}
