//! Configuration model loaded from external sources.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the HTTP server and the workers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    /// Upper bound on pooled SQLite connections.
    #[serde(default = "default_db_pool_size")]
    pub db_pool_size: u32,
    /// How long a connection waits on a locked database.
    #[serde(default = "default_db_busy_timeout_ms")]
    pub db_busy_timeout_ms: u64,
    /// HS256 key used to verify session tokens.
    pub secret: String,
    /// Where unauthenticated users are sent to sign in.
    pub auth_service_url: String,
    /// Base URL of the trading platform's identity service.
    pub platform_auth_url: String,
    pub platform_api_key: String,
    /// Main-wallet balance granted on platform registration, e.g. `"10000.00"`.
    #[serde(default = "default_initial_balance")]
    pub platform_initial_balance: String,
    /// ZeroMQ endpoint the change feed is published on.
    pub zmq_changes_pub: String,
    /// ZeroMQ endpoint workers subscribe to.
    pub zmq_changes_sub: String,
    /// ZeroMQ endpoint the notification worker publishes its own rows on.
    #[serde(default = "default_worker_pub")]
    pub zmq_worker_pub: String,
}

fn default_db_pool_size() -> u32 {
    10
}

fn default_db_busy_timeout_ms() -> u64 {
    30_000
}

fn default_worker_pub() -> String {
    "tcp://127.0.0.1:5562".to_string()
}

fn default_initial_balance() -> String {
    "10000.00".to_string()
}
