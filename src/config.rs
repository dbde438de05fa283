use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::pricing::PricingPolicy;
use crate::domain::catalog::{MembershipTier, User};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub catalog_path: PathBuf,
    pub payment_latency: Duration,
    pub pricing: PricingPolicy,
    /// Signed-in user; `None` browses as a guest.
    pub user: Option<User>,
}

impl AppConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let or_default =
            |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let port = parse("PORT", or_default("PORT", "8080"))?;
        let latency_ms: u64 = parse("PAYMENT_LATENCY_MS", or_default("PAYMENT_LATENCY_MS", "2000"))?;
        let defaults = PricingPolicy::default();
        let pricing = PricingPolicy {
            flat_shipping_fee: match lookup("FLAT_SHIPPING_FEE") {
                Some(v) => parse("FLAT_SHIPPING_FEE", v)?,
                None => defaults.flat_shipping_fee.clone(),
            },
            free_shipping_threshold: match lookup("FREE_SHIPPING_THRESHOLD") {
                Some(v) => parse("FREE_SHIPPING_THRESHOLD", v)?,
                None => defaults.free_shipping_threshold.clone(),
            },
            ..defaults
        };

        let user = match lookup("USER_ID").filter(|id| !id.trim().is_empty()) {
            Some(id) => Some(User {
                name: lookup("USER_NAME").unwrap_or_else(|| id.clone()),
                email: lookup("USER_EMAIL").unwrap_or_default(),
                membership: match lookup("MEMBERSHIP_TIER").filter(|t| !t.is_empty()) {
                    Some(tier) => Some(parse::<MembershipTier>("MEMBERSHIP_TIER", tier)?),
                    None => None,
                },
                id,
            }),
            None => None,
        };

        Ok(Self {
            host: or_default("HOST", "0.0.0.0"),
            port,
            data_dir: PathBuf::from(or_default("DATA_DIR", "./data")),
            catalog_path: PathBuf::from(or_default("CATALOG_PATH", "./catalog.json")),
            payment_latency: Duration::from_millis(latency_ms),
            pricing,
            user,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}
