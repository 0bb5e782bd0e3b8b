use super::amount::{lenient_amount, lenient_qty};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Approval stages in workflow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApprovalStage {
    #[serde(rename = "grnDone")]
    GrnDone,
    #[serde(rename = "itDepApproved")]
    ItDepApproved,
    #[serde(rename = "procApproved")]
    ProcApproved,
    #[serde(rename = "finApproved")]
    FinApproved,
    #[serde(rename = "paid")]
    Paid,
}

impl ApprovalStage {
    pub const ALL: [ApprovalStage; 5] = [
        ApprovalStage::GrnDone,
        ApprovalStage::ItDepApproved,
        ApprovalStage::ProcApproved,
        ApprovalStage::FinApproved,
        ApprovalStage::Paid,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ApprovalStage::GrnDone => "GRN",
            ApprovalStage::ItDepApproved => "IT",
            ApprovalStage::ProcApproved => "Proc",
            ApprovalStage::FinApproved => "Finance",
            ApprovalStage::Paid => "Paid",
        }
    }
}

impl fmt::Display for ApprovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payment row, one per invoice line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub invoice_id: String,
    #[serde(default)]
    pub po_number: String,
    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: u32,
    #[serde(default)]
    pub currency: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub unit_price: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_ex_tax: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub tax: BigDecimal,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub grand_total: BigDecimal,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: BTreeMap<ApprovalStage, bool>,
}

impl Payment {
    pub fn stage_done(&self, stage: ApprovalStage) -> bool {
        self.status.get(&stage).copied().unwrap_or(false)
    }
}

/// How close a payment is to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DueState {
    Overdue,
    DueSoon,
    OnTrack,
}

impl DueState {
    pub fn from_days(days_until_due: i64) -> Self {
        if days_until_due < 0 {
            DueState::Overdue
        } else if days_until_due <= 7 {
            DueState::DueSoon
        } else {
            DueState::OnTrack
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub days_until_due: i64,
    pub due_state: DueState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StageUpdate {
    pub stage: ApprovalStage,
    pub done: bool,
}
