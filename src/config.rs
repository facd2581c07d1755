use anyhow::{bail, Result};
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::pricing::PricingPolicy;
use crate::retry::RetryPolicy;
use crate::services::StorefrontSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// In-process store with a fixture catalog. Nothing survives a restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "fixture" => Ok(Self::Memory),
            other => bail!("Unknown STORE_BACKEND {other:?}, expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    pub catalog_fixture_path: Option<String>,
    pub nats_url: Option<String>,
    pub nats_subject_prefix: String,
    pub reaper_interval: Duration,
    pub storefront: StorefrontSettings,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e| anyhow::anyhow!("Invalid {key}: {e}")),
        _ => Ok(default),
    }
}

/// Whole seconds that must be non-zero, e.g. timer periods.
fn positive_secs(key: &str, default: u64) -> Result<Duration> {
    match var_or(key, default)? {
        0 => bail!("{key} must be greater than zero"),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self> {
        let backend: StoreBackend = var_or("STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = optional("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL not set (set STORE_BACKEND=memory to run without a database)");
        }

        let defaults = StorefrontSettings::default();
        let pricing = PricingPolicy {
            free_shipping_threshold: var_or("FREE_SHIPPING_THRESHOLD", defaults.pricing.free_shipping_threshold)?,
            flat_shipping_rate: var_or("FLAT_SHIPPING_RATE", defaults.pricing.flat_shipping_rate)?,
            tax_rate: var_or("TAX_RATE", defaults.pricing.tax_rate)?,
        };
        if pricing.tax_rate.is_sign_negative() || pricing.tax_rate > Decimal::ONE {
            bail!("TAX_RATE must be between 0 and 1");
        }

        let storefront = StorefrontSettings {
            currency: var_or("CURRENCY", defaults.currency)?,
            pricing,
            cart_ttl: chrono::Duration::days(var_or("CART_TTL_DAYS", 30)?),
            cart_stale_after: chrono::Duration::days(var_or("CART_STALE_DAYS", 30)?),
            estimated_delivery: chrono::Duration::days(var_or("ESTIMATED_DELIVERY_DAYS", 7)?),
            order_number_prefix: var_or("ORDER_NUMBER_PREFIX", defaults.order_number_prefix)?,
            retry: RetryPolicy::default(),
        };

        Ok(Config {
            port: var_or("PORT", 8083)?,
            backend,
            database_url,
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 10)?,
            db_connect_timeout: positive_secs("DB_CONNECT_TIMEOUT_SECS", 5)?,
            catalog_fixture_path: optional("CATALOG_FIXTURE_PATH"),
            nats_url: optional("NATS_URL"),
            nats_subject_prefix: var_or("NATS_SUBJECT_PREFIX", "storefront".to_string())?,
            reaper_interval: positive_secs("REAPER_INTERVAL_SECS", 3600)?,
            storefront,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("Postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert_eq!(" memory ".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_var_or_falls_back_for_missing_keys() {
        let port: u16 = var_or("BLOOM_TEST_SURELY_UNSET_PORT", 8083).unwrap();
        assert_eq!(port, 8083);
    }

    #[test]
    fn test_zero_interval_rejected() {
        env::set_var("BLOOM_TEST_ZERO_INTERVAL_SECS", "0");
        let err = positive_secs("BLOOM_TEST_ZERO_INTERVAL_SECS", 3600).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));
        env::set_var("BLOOM_TEST_ZERO_INTERVAL_SECS", "90");
        assert_eq!(positive_secs("BLOOM_TEST_ZERO_INTERVAL_SECS", 3600).unwrap(), Duration::from_secs(90));
        assert_eq!(positive_secs("BLOOM_TEST_SURELY_UNSET_INTERVAL", 3600).unwrap(), Duration::from_secs(3600));
    }
}
