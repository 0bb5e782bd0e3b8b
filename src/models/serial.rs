use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived state of one issued serial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SerialStatus {
    Available,
    Allocated,
    Scrapped,
}

impl SerialStatus {
    /// Scrapped wins over Allocated, Allocated over Available.
    pub fn derive(allocated: bool, scrapped: bool) -> Self {
        if scrapped {
            SerialStatus::Scrapped
        } else if allocated {
            SerialStatus::Allocated
        } else {
            SerialStatus::Available
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SerialStatus::Available => "Available",
            SerialStatus::Allocated => "Allocated",
            SerialStatus::Scrapped => "Scrapped",
        }
    }
}

impl fmt::Display for SerialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialStatusRow {
    pub serial: String,
    pub item_name: String,
    pub model_name: String,
    pub warranty: String,
    pub invoice_id: String,
    pub status: SerialStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialCount {
    pub serial: String,
    pub count: usize,
}

/// Data anomalies the status precedence would otherwise hide
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Serials issued on more than one line item (or twice on one)
    pub duplicate_serials: Vec<SerialCount>,
    /// Serials with more than one allocation row
    pub multiply_allocated: Vec<SerialCount>,
    pub scrapped_while_allocated: Vec<String>,
    /// Allocation or scrap rows naming a serial no line item issued
    pub unknown_references: Vec<String>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_serials.is_empty()
            && self.multiply_allocated.is_empty()
            && self.scrapped_while_allocated.is_empty()
            && self.unknown_references.is_empty()
    }
}

/// Distinct names for form autocompletion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Suggestions {
    pub suppliers: Vec<String>,
    pub items: Vec<String>,
    pub models: Vec<String>,
    pub users: Vec<String>,
}
