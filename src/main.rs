use equip_inventory::{api, create_pool, AppConfig, InventoryService, SqliteStore};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting equipment inventory with config: {:?}", config);

    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    info!("Record store opened at {}", config.database.url);

    let service = Arc::new(InventoryService::new(
        SqliteStore::new(pool),
        config.defaults.clone(),
    ));

    let app = api::router(service);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
