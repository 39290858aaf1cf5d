use std::env;

use chrono::Duration;
use fine_payment_engine::DEFAULT_TRANSACTION_TIMEOUT_HOURS;
use fpg_common::{helpers::parse_boolean_flag, Secret};
use log::*;

const DEFAULT_FPG_HOST: &str = "127.0.0.1";
const DEFAULT_FPG_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/fine_payments.db";
const DEFAULT_PAYME_LOGIN: &str = "Paycom";
const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub payme: PaymeConfig,
    /// How long a transaction may stay pending before the expiry worker cancels it.
    pub transaction_timeout: Duration,
    /// The time between two runs of the expiry worker.
    pub expiry_sweep_interval: std::time::Duration,
}

/// Credentials the gateway presents on every call.
#[derive(Clone, Debug)]
pub struct PaymeConfig {
    pub login: String,
    pub merchant_key: Secret<String>,
    /// If false, the Basic authorization header is not checked. **DANGER**
    pub auth_checks: bool,
}

impl Default for PaymeConfig {
    fn default() -> Self {
        Self { login: DEFAULT_PAYME_LOGIN.to_string(), merchant_key: Secret::default(), auth_checks: true }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FPG_HOST.to_string(),
            port: DEFAULT_FPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            payme: PaymeConfig::default(),
            transaction_timeout: Duration::hours(DEFAULT_TRANSACTION_TIMEOUT_HOURS),
            expiry_sweep_interval: std::time::Duration::from_secs(DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FPG_HOST").ok().unwrap_or_else(|| DEFAULT_FPG_HOST.into());
        let port = env::var("FPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FPG_PORT. {e} Using the default, {DEFAULT_FPG_PORT}, instead."
                    );
                    DEFAULT_FPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FPG_PORT);
        let database_url = env::var("FPG_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ FPG_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let payme = PaymeConfig::from_env_or_default();
        let transaction_timeout = configure_transaction_timeout();
        let expiry_sweep_interval = configure_sweep_interval();
        Self { host, port, database_url, payme, transaction_timeout, expiry_sweep_interval }
    }
}

impl PaymeConfig {
    pub fn from_env_or_default() -> Self {
        let login = env::var("FPG_PAYME_LOGIN").ok().unwrap_or_else(|| DEFAULT_PAYME_LOGIN.to_string());
        let auth_checks = parse_boolean_flag(env::var("FPG_PAYME_AUTH_CHECKS").ok(), true);
        let merchant_key = env::var("FPG_PAYME_MERCHANT_KEY").ok().unwrap_or_else(|| {
            if auth_checks {
                error!(
                    "🪛️ FPG_PAYME_MERCHANT_KEY is not set. Every gateway call will be refused until it is set to the \
                     merchant key issued by Payme."
                );
            }
            String::default()
        });
        if !auth_checks {
            warn!("🚨️🚨️🚨️ Payme authorization checks are DISABLED. Never run a production instance like this. 🚨️🚨️🚨️");
        }
        Self { login, merchant_key: Secret::new(merchant_key), auth_checks }
    }
}

fn configure_transaction_timeout() -> Duration {
    env::var("FPG_TRANSACTION_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ FPG_TRANSACTION_TIMEOUT is not set. Using the default value of {DEFAULT_TRANSACTION_TIMEOUT_HOURS} \
                 hrs."
            )
        })
        .and_then(|s| match s.parse::<i64>() {
            Ok(hours) if hours > 0 => Ok(Duration::hours(hours)),
            Ok(hours) => Err(warn!("🪛️ FPG_TRANSACTION_TIMEOUT must be positive, not {hours}. Using the default.")),
            Err(e) => Err(warn!("🪛️ Invalid configuration value for FPG_TRANSACTION_TIMEOUT. {e}")),
        })
        .unwrap_or_else(|_| Duration::hours(DEFAULT_TRANSACTION_TIMEOUT_HOURS))
}

fn configure_sweep_interval() -> std::time::Duration {
    env::var("FPG_EXPIRY_SWEEP_INTERVAL")
        .map_err(|_| {
            info!(
                "🪛️ FPG_EXPIRY_SWEEP_INTERVAL is not set. Using the default value of \
                 {DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS}s."
            )
        })
        .and_then(|s| match s.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(std::time::Duration::from_secs(secs)),
            Ok(_) => Err(warn!("🪛️ FPG_EXPIRY_SWEEP_INTERVAL must be positive. Using the default.")),
            Err(e) => Err(warn!("🪛️ Invalid configuration value for FPG_EXPIRY_SWEEP_INTERVAL. {e}")),
        })
        .unwrap_or_else(|_| std::time::Duration::from_secs(DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS))
}
