use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::str::FromStr;
use std::time::Duration;

/// Records of every collection live in one table, keyed by (collection, id).
/// Secondary index entries are kept in `record_index` and rewritten on each put.
const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS records (
        collection TEXT NOT NULL,
        id         TEXT NOT NULL,
        body       TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS record_index (
        collection TEXT NOT NULL,
        index_name TEXT NOT NULL,
        value      TEXT NOT NULL,
        record_id  TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_record_index_lookup ON record_index (collection, index_name, value)",
    "CREATE INDEX IF NOT EXISTS idx_record_index_owner ON record_index (collection, record_id)",
];

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Opens (creating if needed) the local SQLite database and ensures the schema exists.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let mut connect_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    // Slow statement threshold: 1s
    connect_options = connect_options.log_slow_statements(
        tracing::log::LevelFilter::Warn,
        Duration::from_secs(1),
    );

    let mut pool_options = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(10));

    // Each connection to an in-memory database is a separate database
    if is_in_memory(database_url) {
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options.connect_with(connect_options).await?;
    init_schema(&pool).await?;
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("Record store schema ready");
    Ok(())
}
