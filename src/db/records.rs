use super::store::{Collection, Index, Record};
use crate::models::{Allocation, Invoice, InvoiceLineItem, Payment, ScrappedRecord, Setting};

impl Record for Invoice {
    const COLLECTION: Collection = Collection::Invoices;

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, index: Index) -> Option<String> {
        match index {
            Index::ByDate => Some(self.date.to_string()),
            Index::ByInvoice => Some(self.invoice_number.clone()),
            Index::ByPo => Some(self.po_number.clone()),
            Index::BySupplier => Some(self.supplier_name.clone()),
            _ => None,
        }
    }
}

impl Record for InvoiceLineItem {
    const COLLECTION: Collection = Collection::InvoiceItems;

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, index: Index) -> Option<String> {
        match index {
            Index::ByInvoiceId => Some(self.invoice_id.clone()),
            Index::ByItem => Some(self.item_name.clone()),
            Index::ByModel => Some(self.model_name.clone()),
            _ => None,
        }
    }
}

impl Record for Allocation {
    const COLLECTION: Collection = Collection::Allocations;

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, index: Index) -> Option<String> {
        match index {
            Index::ByDt => Some(self.dt.to_rfc3339()),
            Index::ByUser => Some(self.user_name.clone()),
            Index::ByItem => Some(self.item_name.clone()),
            Index::ByModel => Some(self.model_name.clone()),
            Index::BySerial => Some(self.serial.clone()),
            _ => None,
        }
    }
}

impl Record for ScrappedRecord {
    const COLLECTION: Collection = Collection::Scrapped;

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, index: Index) -> Option<String> {
        match index {
            Index::ByDt => Some(self.dt.to_rfc3339()),
            Index::ByItem => Some(self.item_name.clone()),
            Index::BySerial => Some(self.serial.clone()),
            _ => None,
        }
    }
}

impl Record for Payment {
    const COLLECTION: Collection = Collection::Payments;

    fn key(&self) -> &str {
        &self.id
    }

    fn index_value(&self, index: Index) -> Option<String> {
        match index {
            Index::ByInvoice => Some(self.invoice_number.clone()),
            Index::ByPo => Some(self.po_number.clone()),
            Index::BySupplier => Some(self.supplier_name.clone()),
            Index::ByItem => Some(self.item_name.clone()),
            Index::ByModel => Some(self.model_name.clone()),
            Index::ByDueDate => Some(self.due_date.to_string()),
            _ => None,
        }
    }
}

impl Record for Setting {
    const COLLECTION: Collection = Collection::Settings;

    fn key(&self) -> &str {
        &self.key
    }

    fn index_value(&self, _index: Index) -> Option<String> {
        None
    }
}
