use crate::error::StoreError;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;

/// Keyed collections of the local record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Invoices,
    InvoiceItems,
    Allocations,
    Scrapped,
    Payments,
    Settings,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Invoices,
        Collection::InvoiceItems,
        Collection::Allocations,
        Collection::Scrapped,
        Collection::Payments,
        Collection::Settings,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Invoices => "invoices",
            Collection::InvoiceItems => "invoice_items",
            Collection::Allocations => "allocations",
            Collection::Scrapped => "scrapped",
            Collection::Payments => "payments",
            Collection::Settings => "settings",
        }
    }

    /// Secondary indexes declared on the collection
    pub fn indexes(self) -> &'static [Index] {
        match self {
            Collection::Invoices => &[Index::ByDate, Index::ByInvoice, Index::ByPo, Index::BySupplier],
            Collection::InvoiceItems => &[Index::ByInvoiceId, Index::ByItem, Index::ByModel],
            Collection::Allocations => &[
                Index::ByDt,
                Index::ByUser,
                Index::ByItem,
                Index::ByModel,
                Index::BySerial,
            ],
            Collection::Scrapped => &[Index::ByDt, Index::ByItem, Index::BySerial],
            Collection::Payments => &[
                Index::ByInvoice,
                Index::ByPo,
                Index::BySupplier,
                Index::ByItem,
                Index::ByModel,
                Index::ByDueDate,
            ],
            Collection::Settings => &[],
        }
    }

    pub fn supports(self, index: Index) -> bool {
        self.indexes().contains(&index)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    ByDate,
    ByInvoice,
    ByPo,
    BySupplier,
    ByInvoiceId,
    ByItem,
    ByModel,
    ByDt,
    ByUser,
    BySerial,
    ByDueDate,
}

impl Index {
    pub fn name(self) -> &'static str {
        match self {
            Index::ByDate => "byDate",
            Index::ByInvoice => "byInvoice",
            Index::ByPo => "byPO",
            Index::BySupplier => "bySupplier",
            Index::ByInvoiceId => "byInvoiceId",
            Index::ByItem => "byItem",
            Index::ByModel => "byModel",
            Index::ByDt => "byDt",
            Index::ByUser => "byUser",
            Index::BySerial => "bySerial",
            Index::ByDueDate => "byDueDate",
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value stored in one collection under a string primary key
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn key(&self) -> &str;

    /// Value this record contributes to `index`, if the index applies to it
    fn index_value(&self, index: Index) -> Option<String>;
}

/// Durable keyed storage. `put` is an upsert by primary key; `get_all` returns key order.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn put<R: Record>(&self, record: &R) -> Result<String, StoreError>;

    async fn get<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError>;

    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError>;

    async fn get_all_by_index<R: Record>(&self, index: Index, value: &str) -> Result<Vec<R>, StoreError>;

    async fn delete<R: Record>(&self, key: &str) -> Result<(), StoreError>;
}

pub(crate) fn check_index<R: Record>(index: Index) -> Result<(), StoreError> {
    if R::COLLECTION.supports(index) {
        Ok(())
    } else {
        Err(StoreError::UnknownIndex {
            collection: R::COLLECTION,
            index,
        })
    }
}
