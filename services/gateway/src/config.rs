use dotenv::dotenv;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use types::ids::PairId;

const PORT: &str = "PORT";
const BIND_ADDR: &str = "BIND_ADDR";
const DATABASE_URL: &str = "DATABASE_URL";
const DB_MAX_CONNECTIONS: &str = "DB_MAX_CONNECTIONS";
const DB_CONNECT_TIMEOUT_SECS: &str = "DB_CONNECT_TIMEOUT_SECS";
const DEFAULT_PAIR: &str = "DEFAULT_PAIR";
const BOOK_DEPTH: &str = "BOOK_DEPTH";
const SHUTDOWN_GRACE_SECS: &str = "SHUTDOWN_GRACE_SECS";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
}

/// Gateway runtime settings
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Unset means the in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_connect_timeout: Duration,
    /// Pair used by `/trades/match` when the query omits one
    pub default_pair: PairId,
    pub book_depth: usize,
    pub shutdown_grace: Duration,
}

impl GatewayConfig {
    /// Read settings from the process environment, loading `.env` first
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; missing keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let config = Self {
            bind_addr: parse_or(&lookup, BIND_ADDR, IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
            port: parse_or(&lookup, PORT, 8080)?,
            database_url,
            db_max_connections: positive(DB_MAX_CONNECTIONS, parse_or(&lookup, DB_MAX_CONNECTIONS, 32)?)?,
            db_connect_timeout: Duration::from_secs(parse_or(&lookup, DB_CONNECT_TIMEOUT_SECS, 5)?),
            default_pair: default_pair(&lookup)?,
            book_depth: positive(BOOK_DEPTH, parse_or(&lookup, BOOK_DEPTH, 50)?)?,
            shutdown_grace: Duration::from_secs(parse_or(&lookup, SHUTDOWN_GRACE_SECS, 30)?),
        };
        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn positive<T: Default + PartialEq>(key: &'static str, value: T) -> Result<T, ConfigError> {
    if value == T::default() {
        Err(ConfigError::Zero { key })
    } else {
        Ok(value)
    }
}

fn default_pair<F>(lookup: &F) -> Result<PairId, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(DEFAULT_PAIR).unwrap_or_else(|| "BTCUSDT".to_string());
    PairId::try_new(raw.trim()).map_err(|_| ConfigError::Invalid {
        key: DEFAULT_PAIR,
        value: raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.socket_addr(), "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.database_url, None);
        assert_eq!(config.db_max_connections, 32);
        assert_eq!(config.db_connect_timeout, Duration::from_secs(5));
        assert_eq!(config.default_pair.as_str(), "BTCUSDT");
        assert_eq!(config.book_depth, 50);
        assert_eq!(config.shutdown_grace, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = GatewayConfig::from_lookup(lookup_from(&[
            (PORT, "9000"),
            (BIND_ADDR, "127.0.0.1"),
            (DATABASE_URL, "postgres://localhost/venue"),
            (DEFAULT_PAIR, "ETHUSDT"),
            (BOOK_DEPTH, " 10 "),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr(), "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/venue"));
        assert_eq!(config.default_pair.as_str(), "ETHUSDT");
        assert_eq!(config.book_depth, 10);
    }

    #[test]
    fn test_blank_database_url_is_unset() {
        let config = GatewayConfig::from_lookup(lookup_from(&[(DATABASE_URL, "  ")])).unwrap();
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_invalid_values() {
        let err = GatewayConfig::from_lookup(lookup_from(&[(PORT, "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: PORT,
                value: "eighty".to_string()
            }
        );

        let err = GatewayConfig::from_lookup(lookup_from(&[(BOOK_DEPTH, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero { key: BOOK_DEPTH });

        let err = GatewayConfig::from_lookup(lookup_from(&[(DEFAULT_PAIR, "BTC USDT")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: DEFAULT_PAIR, .. }));
    }
}
