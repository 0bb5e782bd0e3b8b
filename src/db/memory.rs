use super::store::{check_index, Collection, Index, Record, RecordStore};
use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;

/// Volatile record store. Records are kept encoded so reads behave like the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<Collection, BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn decode_all<R: Record>(values: Vec<Value>) -> Result<Vec<R>, StoreError> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(StoreError::from))
        .collect()
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put<R: Record>(&self, record: &R) -> Result<String, StoreError> {
        let key = record.key().to_string();
        let value = serde_json::to_value(record)?;
        self.collections
            .entry(R::COLLECTION)
            .or_default()
            .insert(key.clone(), value);
        Ok(key)
    }

    async fn get<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        let value = self
            .collections
            .get(&R::COLLECTION)
            .and_then(|records| records.get(key).cloned());

        match value {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        decode_all(self.snapshot(R::COLLECTION))
    }

    async fn get_all_by_index<R: Record>(&self, index: Index, value: &str) -> Result<Vec<R>, StoreError> {
        check_index::<R>(index)?;

        let records: Vec<R> = decode_all(self.snapshot(R::COLLECTION))?;
        Ok(records
            .into_iter()
            .filter(|record| record.index_value(index).as_deref() == Some(value))
            .collect())
    }

    async fn delete<R: Record>(&self, key: &str) -> Result<(), StoreError> {
        if let Some(mut records) = self.collections.get_mut(&R::COLLECTION) {
            records.remove(key);
        }
        Ok(())
    }
}
