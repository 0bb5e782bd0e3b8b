pub mod allocation;
pub mod amount;
pub mod invoice;
pub mod payment;
pub mod serial;
pub mod settings;

pub use allocation::{Allocation, AllocationRequest, ScrapRequest, ScrappedRecord};
pub use invoice::{DeletedInvoice, Invoice, InvoiceDetail, InvoiceLineItem, NewInvoice, NewLineItem};
pub use payment::{ApprovalStage, DueState, Payment, PaymentView, StageUpdate};
pub use serial::{IntegrityReport, SerialCount, SerialStatus, SerialStatusRow, Suggestions};
pub use settings::{Setting, Settings, CREDIT_DAYS_KEY, SERIAL_PATTERN_KEY};

/// Record id in the form `<prefix>_<uuid>`
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}
