use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 18720;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Dispatcher tick cadence. Bucket resolution is fixed to one minute to
/// match; changing one without the other widens the catch-up gap.
pub const DEFAULT_SWEEP_PERIOD_SECS: u64 = 60;
/// How long an action (and its bucket entry) survives in the store before
/// the per-key expiry discards it.
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Top-level config (slated.toml + SLATED_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlatedConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub board: BoardConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for SlatedConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            board: BoardConfig {
                base_url: default_board_base_url(),
                api_key: String::new(),
            },
            scheduler: SchedulerConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// The external board service actions are executed against.
///
/// `api_key` is the service-level key; the per-action user token arrives
/// with each schedule request and is stored opaquely alongside the action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_board_base_url")]
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_sweep_period")]
    pub sweep_period_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_period_secs: DEFAULT_SWEEP_PERIOD_SECS,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl SchedulerConfig {
    pub fn retention(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.retention_days * 24 * 60 * 60)
    }

    pub fn sweep_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_period_secs)
    }
}

/// Which store adapter backs the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map with per-key deadlines. State dies with the process.
    Memory,
    /// rusqlite-backed kv table with an expires_at column.
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_board_base_url() -> String {
    "https://api.trello.com/1".to_string()
}
fn default_sweep_period() -> u64 {
    DEFAULT_SWEEP_PERIOD_SECS
}
fn default_retention_days() -> u64 {
    DEFAULT_RETENTION_DAYS
}
fn default_store_backend() -> StoreBackend {
    StoreBackend::Sqlite
}
fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.slated/slated.db", home)
}

impl SlatedConfig {
    /// Load config from a TOML file with SLATED_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.slated/slated.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: SlatedConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("SLATED_").split("_"))
            .extract()
            .map_err(|e| crate::error::SlatedError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.slated/slated.toml", home)
}
