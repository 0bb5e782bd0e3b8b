pub mod inventory;
pub mod report;
pub mod serial;
pub mod status;
pub mod totals;

pub use inventory::InventoryService;
pub use serial::{generate, SerialContext};
pub use status::{integrity_report, resolve_statuses};
pub use totals::{calc_grand, LineAmounts, LineTotals};
