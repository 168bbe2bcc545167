use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::settlement::GatewaySecret;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/settlement";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3001);
const DEFAULT_NOTIFICATION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Mail relay endpoint; confirmations are only logged when unset.
    pub webhook_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub cors_allowed_origins: Option<String>,
    pub gateway_secret: GatewaySecret,
    pub notification: NotificationConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gateway_secret = lookup("PAYMENT_GATEWAY_SECRET")
            .filter(|s| !s.is_empty())
            .map(GatewaySecret::new)
            .ok_or(ConfigError::Missing("PAYMENT_GATEWAY_SECRET"))?;

        let webhook_url = lookup("NOTIFICATION_WEBHOOK_URL").filter(|s| !s.trim().is_empty());

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR)?,
            environment: Environment::parse(lookup("RUST_ENV").as_deref()),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS"),
            gateway_secret,
            notification: NotificationConfig {
                webhook_url,
                timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "NOTIFICATION_TIMEOUT_SECS",
                    DEFAULT_NOTIFICATION_TIMEOUT_SECS,
                )?),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
