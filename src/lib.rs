pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, MemoryStore, RecordStore, SqliteStore};
pub use error::{ServiceError, StoreError};
pub use service::InventoryService;
