//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (unless `STORE_BACKEND=memory`)
//! - `STORE_LAT` / `STORE_LNG` - Store coordinates (decimal degrees)
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `STORE_BACKEND` - `postgres` (default) or `memory` (local development)
//! - `DELIVERY_RADIUS_KM` - Delivery coverage radius (default: 12)
//! - `SHIPPING_BASE` - Base shipping fee in pesos (default: 2000)
//! - `SHIPPING_PER_KM` - Per-kilometer rate in pesos (default: 400)
//! - `SHIPPING_MIN` - Minimum shipping fee in pesos (default: 5000)
//! - `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` - Twilio credentials
//! - `TWILIO_WHATSAPP_NUMBER` - Sender number (e.g. `whatsapp:+14155238886`)
//! - `SEND_WHATSAPP_NOTIFS` - Master switch for outbound WhatsApp (default: false)
//! - `WHATSAPP_SEND_STATUS_UPDATES` - Also notify on status changes (default: true)
//! - `DEV_HEADER_AUTH` - Accept `x-user-id`/`x-user-role` headers as the
//!   authenticated principal (default: false; local development only)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which storage backend the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// `PostgreSQL` via sqlx (production).
    Postgres,
    /// In-memory store (local development, no persistence).
    Memory,
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password).
    /// `None` only when running against the in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Storage backend selection
    pub store_backend: StoreBackend,
    /// Delivery coverage and shipping cost parameters
    pub shipping: ShippingConfig,
    /// Outbound WhatsApp configuration
    pub whatsapp: WhatsAppConfig,
    /// Accept `x-user-id`/`x-user-role` headers as the principal (dev only)
    pub dev_header_auth: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Store location, coverage radius, and shipping fee tiers.
///
/// All fees are integer Colombian pesos.
#[derive(Debug, Clone, Copy)]
pub struct ShippingConfig {
    /// Store latitude in decimal degrees
    pub store_lat: f64,
    /// Store longitude in decimal degrees
    pub store_lng: f64,
    /// Maximum delivery distance from the store in kilometers
    pub radius_km: f64,
    /// Base shipping fee
    pub base: i64,
    /// Per-kilometer rate
    pub per_km: i64,
    /// Minimum shipping fee (floor regardless of proximity)
    pub min: i64,
}

/// Twilio WhatsApp channel configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct WhatsAppConfig {
    /// Twilio account SID (empty disables the client)
    pub account_sid: String,
    /// Twilio auth token
    pub auth_token: SecretString,
    /// Sender number, including the `whatsapp:` prefix
    pub from: String,
    /// Master switch for outbound WhatsApp
    pub enabled: bool,
    /// Also send short messages on status changes
    pub send_status_updates: bool,
}

impl std::fmt::Debug for WhatsAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from", &self.from)
            .field("enabled", &self.enabled)
            .field("send_status_updates", &self.send_status_updates)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    /// Store coordinates fail fast here rather than at first order.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store_backend = match get_env_or_default("STORE_BACKEND", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "STORE_BACKEND".to_owned(),
                    format!("expected postgres or memory, got {other}"),
                ));
            }
        };
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(SecretString::from(get_required_env("DATABASE_URL")?)),
            StoreBackend::Memory => None,
        };

        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_owned(), e.to_string()))?;

        Ok(Self {
            database_url,
            host,
            port,
            store_backend,
            shipping: ShippingConfig::from_env()?,
            whatsapp: WhatsAppConfig::from_env(),
            dev_header_auth: get_bool_env("DEV_HEADER_AUTH", false),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShippingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store_lat: get_f64_env("STORE_LAT")?,
            store_lng: get_f64_env("STORE_LNG")?,
            radius_km: get_f64_env_or("DELIVERY_RADIUS_KM", 12.0)?,
            base: get_i64_env_or("SHIPPING_BASE", 2000)?,
            per_km: get_i64_env_or("SHIPPING_PER_KM", 400)?,
            min: get_i64_env_or("SHIPPING_MIN", 5000)?,
        })
    }
}

impl WhatsAppConfig {
    fn from_env() -> Self {
        Self {
            account_sid: get_env_or_default("TWILIO_ACCOUNT_SID", ""),
            auth_token: SecretString::from(get_env_or_default("TWILIO_AUTH_TOKEN", "")),
            from: get_env_or_default("TWILIO_WHATSAPP_NUMBER", ""),
            enabled: get_bool_env("SEND_WHATSAPP_NOTIFS", false),
            send_status_updates: get_bool_env("WHATSAPP_SEND_STATUS_UPDATES", true),
        }
    }

    /// Whether the Twilio client has credentials and a sender number.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.from.is_empty()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Get a required f64 environment variable (fails on missing or non-numeric).
fn get_f64_env(key: &str) -> Result<f64, ConfigError> {
    get_required_env(key)?
        .parse::<f64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Get an f64 environment variable with a default.
fn get_f64_env_or(key: &str, default: f64) -> Result<f64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<f64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Get an i64 environment variable with a default.
fn get_i64_env_or(key: &str, default: i64) -> Result<i64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<i64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Get a boolean environment variable ("true", case-insensitive) with a default.
fn get_bool_env(key: &str, default: bool) -> bool {
    std::env::var(key).map_or(default, |v| v.eq_ignore_ascii_case("true"))
}
