//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use common::Money;
use domain::{OrderSettings, ShippingRates};
use store::RetryConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `FREE_SHIPPING_THRESHOLD`, `SHIPPING_STANDARD`, `SHIPPING_FAST`,
///   `SHIPPING_EXPRESS`: shipping table in whole currency units
/// - `DEFAULT_PROVINCE`: province for addresses that leave it empty (default: `"Tehran"`)
/// - `NOTIFY_RECIPIENTS`: comma-separated notification recipients
/// - `ADMIN_EMAIL`, `ADMIN_PASSWORD`: seed an admin account when both are set
/// - `STORE_MAX_RETRIES` (default: `2`), `STORE_RETRY_BASE_MS` (default: `1000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub shipping: ShippingRates,
    pub default_province: String,
    pub notify_recipients: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub store_max_retries: u32,
    pub store_retry_base_ms: u64,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated list, dropping blanks.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let rates = defaults.shipping;

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: env_or("PORT", defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: env_non_empty("DATABASE_URL"),
            shipping: ShippingRates {
                free_shipping_threshold: Money::new(env_or(
                    "FREE_SHIPPING_THRESHOLD",
                    rates.free_shipping_threshold.amount(),
                )),
                standard: Money::new(env_or("SHIPPING_STANDARD", rates.standard.amount())),
                fast: Money::new(env_or("SHIPPING_FAST", rates.fast.amount())),
                express: Money::new(env_or("SHIPPING_EXPRESS", rates.express.amount())),
            },
            default_province: env_non_empty("DEFAULT_PROVINCE").unwrap_or(defaults.default_province),
            notify_recipients: std::env::var("NOTIFY_RECIPIENTS")
                .map(|raw| parse_recipients(&raw))
                .unwrap_or_default(),
            admin_email: env_non_empty("ADMIN_EMAIL"),
            admin_password: env_non_empty("ADMIN_PASSWORD"),
            store_max_retries: env_or("STORE_MAX_RETRIES", defaults.store_max_retries),
            store_retry_base_ms: env_or("STORE_RETRY_BASE_MS", defaults.store_retry_base_ms),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            rates: self.shipping,
            default_province: self.default_province.clone(),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        let base_delay = Duration::from_millis(self.store_retry_base_ms);
        RetryConfig {
            max_retries: self.store_max_retries,
            base_delay,
            max_delay: base_delay.saturating_mul(8),
        }
    }

    /// Returns the admin credentials to seed, if both are configured.
    pub fn admin_seed(&self) -> Option<(&str, &str)> {
        match (&self.admin_email, &self.admin_password) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            shipping: ShippingRates::default(),
            default_province: "Tehran".to_string(),
            notify_recipients: Vec::new(),
            admin_email: None,
            admin_password: None,
            store_max_retries: 2,
            store_retry_base_ms: 1000,
        }
    }
}
