use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub defaults: InventoryDefaults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Values used when the settings collection has no entry yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDefaults {
    pub credit_days: i64,
    pub serial_pattern: String,
    pub currency: String,
    /// Largest quantity accepted on one invoice line
    pub max_line_qty: u32,
}

impl Default for InventoryDefaults {
    fn default() -> Self {
        Self {
            credit_days: 30,
            serial_pattern: "ZRX-{YYYY}-{INV}-{SEQ}".to_string(),
            currency: "LKR".to_string(),
            max_line_qty: 10_000,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "sqlite://equip_inventory.db".to_string(),
                max_connections: 4,
            },
            defaults: InventoryDefaults::default(),
        }
    }
}

/// `INVENTORY_` prefix, `__` between nested keys: `INVENTORY_SERVER__PORT=9000`
fn environment() -> config::Environment {
    config::Environment::with_prefix("INVENTORY")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl AppConfig {
    /// Built-in defaults, then an optional `inventory.{toml,yaml,json}` file,
    /// then `INVENTORY_*` environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::with_name("inventory").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}
