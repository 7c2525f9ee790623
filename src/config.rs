use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_GATEWAY_API_BASE: &str = "https://api.razorpay.com";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_ORDER_ID_PREFIX: &str = "ORD";
const DEFAULT_NOTIFICATION_LOG_CAPACITY: usize = 50;
const DEFAULT_RECENT_WINDOW_SECS: u64 = 5;
const DEFAULT_TOAST_CAPACITY: usize = 5;
const DEFAULT_TOAST_TTL_SECS: u64 = 5;
const DEFAULT_PROCESSING_DELAY_MS: u64 = 3000;
const DEFAULT_SMS_SEND_DELAY_MS: u64 = 1000;
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Which notification kinds fan out to the admin SMS channel.
///
/// Cart adds and placed orders page the admin by default; signups and
/// wishlist adds stay log-only unless enabled per deployment.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmsEligibility {
    #[serde(default = "default_true")]
    pub cart_add: bool,
    #[serde(default = "default_true")]
    pub order_placed: bool,
    #[serde(default)]
    pub user_signup: bool,
    #[serde(default)]
    pub wishlist_add: bool,
}

impl Default for SmsEligibility {
    fn default() -> Self {
        Self {
            cart_add: true,
            order_placed: true,
            user_signup: false,
            wishlist_add: false,
        }
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Payment gateway public key id (safe to hand to the hosted flow)
    pub gateway_key_id: String,

    /// Payment gateway shared secret. Server-side only: signs nothing,
    /// verifies everything. Never serialized into a response.
    pub gateway_key_secret: String,

    /// Base URL of the gateway REST API (overridden in tests)
    #[serde(default = "default_gateway_api_base")]
    pub gateway_api_base: String,

    /// ISO currency code passed to the gateway
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Destination phone number for admin SMS notifications
    pub admin_phone: String,

    /// Subtotal above which shipping is free
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: Decimal,

    /// Flat shipping fee below the free-shipping threshold
    #[serde(default = "default_shipping_flat_fee")]
    pub shipping_flat_fee: Decimal,

    /// Tax rate as a decimal fraction (e.g., 0.18 for 18%)
    #[serde(default = "default_tax_rate")]
    #[validate(custom = "validate_tax_rate")]
    pub tax_rate: Decimal,

    /// Prefix for generated order ids
    #[serde(default = "default_order_id_prefix")]
    pub order_id_prefix: String,

    /// Maximum retained notifications (oldest dropped first)
    #[serde(default = "default_notification_log_capacity")]
    pub notification_log_capacity: usize,

    /// Seconds a notification stays in the transient "recent" view
    #[serde(default = "default_recent_window_secs")]
    pub recent_window_secs: u64,

    /// Maximum concurrently visible toasts
    #[serde(default = "default_toast_capacity")]
    pub toast_capacity: usize,

    /// Seconds before a toast self-expires
    #[serde(default = "default_toast_ttl_secs")]
    pub toast_ttl_secs: u64,

    /// Simulated processing delay for non-gateway payment methods (ms)
    #[serde(default = "default_processing_delay_ms")]
    pub simulated_processing_delay_ms: u64,

    /// Simulated SMS delivery delay (ms)
    #[serde(default = "default_sms_send_delay_ms")]
    pub sms_send_delay_ms: u64,

    /// Event channel capacity for async event processing
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Per-kind SMS fan-out policy
    #[serde(default)]
    pub sms: SmsEligibility,

    /// Seed the demo user table on startup (development convenience)
    #[serde(default)]
    pub seed_demo_users: bool,
}

fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_gateway_api_base() -> String {
    DEFAULT_GATEWAY_API_BASE.to_string()
}
fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}
fn default_order_id_prefix() -> String {
    DEFAULT_ORDER_ID_PREFIX.to_string()
}
fn default_free_shipping_threshold() -> Decimal {
    dec!(1500)
}
fn default_shipping_flat_fee() -> Decimal {
    dec!(99)
}
fn default_tax_rate() -> Decimal {
    dec!(0.18)
}
fn default_notification_log_capacity() -> usize {
    DEFAULT_NOTIFICATION_LOG_CAPACITY
}
fn default_recent_window_secs() -> u64 {
    DEFAULT_RECENT_WINDOW_SECS
}
fn default_toast_capacity() -> usize {
    DEFAULT_TOAST_CAPACITY
}
fn default_toast_ttl_secs() -> u64 {
    DEFAULT_TOAST_TTL_SECS
}
fn default_processing_delay_ms() -> u64 {
    DEFAULT_PROCESSING_DELAY_MS
}
fn default_sms_send_delay_ms() -> u64 {
    DEFAULT_SMS_SEND_DELAY_MS
}
fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

fn validate_tax_rate(rate: &Decimal) -> Result<(), ValidationError> {
    if *rate >= Decimal::ZERO && *rate < Decimal::ONE {
        Ok(())
    } else {
        Err(ValidationError::new("tax_rate_out_of_range"))
    }
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Initialize the tracing subscriber from the configured level, honoring
/// an explicit RUST_LOG override.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Load configuration from `config/default.toml`, an environment-specific
/// file, and `APP__*` environment variables (highest precedence).
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: gateway_key_secret has no default - it MUST be provided via
    // environment variable or config file so a deployment can never fall
    // back to a checked-in secret.
    let builder = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Check for the gateway secret before deserialization to provide a
    // clear error message.
    if config.get_string("gateway_key_secret").is_err() {
        error!("Payment gateway secret is not configured. Set APP__GATEWAY_KEY_SECRET or add gateway_key_secret to the config file.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "gateway_key_secret is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        environment: "test".to_string(),
        log_level: "debug".to_string(),
        log_json: false,
        cors_allowed_origins: None,
        gateway_key_id: "rzp_test_key".to_string(),
        gateway_key_secret: "test_gateway_secret".to_string(),
        gateway_api_base: "http://127.0.0.1:0".to_string(),
        currency: "INR".to_string(),
        admin_phone: "+91 0000000000".to_string(),
        free_shipping_threshold: dec!(1500),
        shipping_flat_fee: dec!(99),
        tax_rate: dec!(0.18),
        order_id_prefix: "ORD".to_string(),
        notification_log_capacity: 50,
        recent_window_secs: 5,
        toast_capacity: 5,
        toast_ttl_secs: 5,
        simulated_processing_delay_ms: 0,
        sms_send_delay_ms: 0,
        event_channel_capacity: 64,
        sms: SmsEligibility::default(),
        seed_demo_users: false,
    }
}
