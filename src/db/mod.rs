pub mod memory;
pub mod pool;
pub mod records;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use pool::{create_pool, init_schema};
pub use sqlite::SqliteStore;
pub use store::{Collection, Index, Record, RecordStore};
