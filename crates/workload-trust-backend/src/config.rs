//! Backend configuration
//!
//! Read once from the environment at startup and passed into constructors.

use std::time::Duration;

use workload_trust_core::env::{duration_or, flag_or, parse_or, string_or, Lookup};
use workload_trust_core::TelemetryConfig;

pub const DEFAULT_SPIFFE_ID: &str = "spiffe://example.org/ns/demo/sa/backend";
pub const DEFAULT_FRONTEND_SPIFFE_ID: &str = "spiffe://example.org/ns/demo/sa/frontend";
pub const DEFAULT_DB_PEER_SPIFFE_ID: &str = "spiffe://example.org/ns/demo/sa/postgres";

/// Which order store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Postgres,
}

impl Default for StoreKind {
    fn default() -> Self {
        if cfg!(feature = "postgres") {
            StoreKind::Postgres
        } else {
            StoreKind::Memory
        }
    }
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreKind::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StoreKind::Postgres),
            _ => Err(format!("Unknown order store: {}", s)),
        }
    }
}

/// Database connection settings
///
/// TLS material is written by the spiffe-helper sidecar.
#[derive(Clone)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime: Duration,
    pub ssl_cert: String,
    pub ssl_key: String,
    pub ssl_root_ca: String,
    /// SPIFFE ID the database presents
    pub peer_spiffe_id: String,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("conn_max_lifetime", &self.conn_max_lifetime)
            .field("ssl_cert", &self.ssl_cert)
            .field("ssl_key", &self.ssl_key)
            .field("ssl_root_ca", &self.ssl_root_ca)
            .field("peer_spiffe_id", &self.peer_spiffe_id)
            .finish()
    }
}

impl DbConfig {
    pub fn from_lookup(env: &impl Lookup) -> Self {
        Self {
            host: string_or(env, "DB_HOST", "postgres.demo.svc.cluster.local"),
            port: parse_or(env, "DB_PORT", 5432),
            user: string_or(env, "DB_USER", "postgres"),
            password: string_or(env, "DB_PASSWORD", ""),
            dbname: string_or(env, "DB_NAME", "demodb"),
            max_open_conns: parse_or(env, "DB_MAX_OPEN_CONNS", 10),
            max_idle_conns: parse_or(env, "DB_MAX_IDLE_CONNS", 5),
            conn_max_lifetime: duration_or(env, "DB_CONN_MAX_LIFETIME", Duration::from_secs(120)),
            ssl_cert: string_or(env, "SSL_CERT", "/spiffe-certs/svid.pem"),
            ssl_key: string_or(env, "SSL_KEY", "/spiffe-certs/svid_key.pem"),
            ssl_root_ca: string_or(env, "SSL_ROOT_CA", "/spiffe-certs/svid_bundle.pem"),
            peer_spiffe_id: string_or(env, "DB_PEER_SPIFFE_ID", DEFAULT_DB_PEER_SPIFFE_ID),
        }
    }

    /// `host:port`, as reported in trust events
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Backend service configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub port: u16,
    /// This workload's SPIFFE ID
    pub spiffe_id: String,
    /// SPIFFE ID the proxy admits callers under
    pub frontend_spiffe_id: String,
    /// Deadline for the direct-trust hop of one demo request
    pub hop_timeout: Duration,
    /// Upper bound on handling one HTTP request
    pub request_timeout: Duration,
    /// Reject demo calls that arrive without `x-forwarded-client-cert`
    pub require_forwarded_identity: bool,
    pub store: StoreKind,
    /// How often to check the client certificate for rotation; zero disables
    pub cert_watch_interval: Duration,
    pub db: DbConfig,
    pub telemetry: TelemetryConfig,
}

impl BackendConfig {
    pub fn from_lookup(env: &impl Lookup) -> Self {
        Self {
            port: parse_or(env, "PORT", 9090),
            spiffe_id: string_or(env, "SPIFFE_ID", DEFAULT_SPIFFE_ID),
            frontend_spiffe_id: string_or(env, "FRONTEND_SPIFFE_ID", DEFAULT_FRONTEND_SPIFFE_ID),
            hop_timeout: duration_or(env, "DEMO_HOP_TIMEOUT", Duration::from_secs(5)),
            request_timeout: duration_or(env, "REQUEST_TIMEOUT", Duration::from_secs(10)),
            require_forwarded_identity: flag_or(env, "REQUIRE_FORWARDED_IDENTITY", false),
            store: parse_or(env, "ORDER_STORE", StoreKind::default()),
            cert_watch_interval: duration_or(env, "CERT_WATCH_INTERVAL", Duration::from_secs(30)),
            db: DbConfig::from_lookup(env),
            telemetry: TelemetryConfig::from_lookup(env),
        }
    }
}
