use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// Startup timeout for initialization operations in seconds
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// Seconds a delivered message may stay unacknowledged before redelivery
    #[serde(default = "default_nats_ack_wait_secs")]
    pub nats_ack_wait_secs: u64,

    /// Max wait time for a fetch in seconds
    #[serde(default = "default_nats_batch_wait_secs")]
    pub nats_batch_wait_secs: u64,

    // HTTP configuration
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_http_request_timeout_secs")]
    pub http_request_timeout_secs: u64,

    /// CORS allowed origins (comma-separated list, "*" for all origins)
    #[serde(default = "default_http_cors_allowed_origins")]
    pub http_cors_allowed_origins: String,

    /// Paths not logged per request (comma-separated)
    #[serde(default = "default_http_ignored_paths")]
    pub http_ignored_paths: String,

    /// Seconds closers get to finish after the processes stopped
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Production deployments invite users to the public web app URL
    #[serde(default)]
    pub production: bool,

    // Cognito configuration
    #[serde(default = "default_cognito_region")]
    pub cognito_region: String,

    /// Pool whose tokens the HTTP API accepts
    #[serde(default = "default_cognito_user_pool_id")]
    pub cognito_user_pool_id: String,

    /// Pool shared by every pooled tenant
    #[serde(default = "default_cognito_shared_pool_id")]
    pub cognito_shared_pool_id: String,

    /// Local identity provider endpoint; AWS is used when unset
    #[serde(default)]
    pub cognito_endpoint: Option<String>,

    /// Overrides the pool's well-known JWKS location
    #[serde(default)]
    pub cognito_jwks_url: Option<String>,

    #[serde(default = "default_cognito_jwks_cache_ttl_secs")]
    pub cognito_jwks_cache_ttl_secs: u64,

    // DynamoDB configuration
    /// Local endpoint such as DynamoDB Local; AWS is used when unset
    #[serde(default)]
    pub dynamodb_endpoint: Option<String>,

    #[serde(default = "default_dynamodb_auth_table")]
    pub dynamodb_auth_table: String,

    #[serde(default = "default_dynamodb_config_table")]
    pub dynamodb_config_table: String,

    #[serde(default = "default_dynamodb_tenant_table")]
    pub dynamodb_tenant_table: String,

    #[serde(default = "default_dynamodb_connection_table")]
    pub dynamodb_connection_table: String,

    // PostgreSQL configuration
    /// PostgreSQL host
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    /// PostgreSQL port
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    /// PostgreSQL database name
    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    /// PostgreSQL username
    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    /// PostgreSQL password
    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    // Tenant routing
    /// Header carrying the routing key of machine clients
    #[serde(default = "default_routing_header")]
    pub routing_header: String,

    /// JSON object mapping routing keys to tenants
    #[serde(default)]
    pub tenant_connection_map: String,

    // OpenTelemetry configuration
    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_enabled")]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

// NATS defaults
fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_startup_timeout_secs() -> u64 {
    30
}

fn default_nats_ack_wait_secs() -> u64 {
    5
}

fn default_nats_batch_wait_secs() -> u64 {
    5
}

// HTTP defaults
fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    4000
}

fn default_http_request_timeout_secs() -> u64 {
    30
}

fn default_http_cors_allowed_origins() -> String {
    "https://localhost:3000".to_string()
}

fn default_http_ignored_paths() -> String {
    "/health".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

// Cognito defaults
fn default_cognito_region() -> String {
    "eu-central-1".to_string()
}

fn default_cognito_user_pool_id() -> String {
    "none".to_string()
}

fn default_cognito_shared_pool_id() -> String {
    "none".to_string()
}

fn default_cognito_jwks_cache_ttl_secs() -> u64 {
    3600
}

// DynamoDB defaults
fn default_dynamodb_auth_table() -> String {
    "auth-info".to_string()
}

fn default_dynamodb_config_table() -> String {
    "silo-config".to_string()
}

fn default_dynamodb_tenant_table() -> String {
    "tenants".to_string()
}

fn default_dynamodb_connection_table() -> String {
    "connections".to_string()
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "postgres".to_string()
}

fn default_postgres_username() -> String {
    "postgres".to_string()
}

fn default_postgres_password() -> String {
    "postgres".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    5
}

// Routing defaults
fn default_routing_header() -> String {
    "BasePath".to_string()
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_enabled() -> bool {
    false
}

fn default_otel_service_name() -> String {
    "saas-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("SAAS"))
            .build()?
            .try_deserialize()
    }

    /// Comma-separated list split into trimmed, non-empty entries
    pub fn ignored_paths(&self) -> Vec<String> {
        self.http_ignored_paths
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}
