use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::HospitalError;

/// Every request runs under this timeout; it is not configurable.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Address family used when resolving contact points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    #[default]
    V4,
    Any,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub hosts: Vec<String>,
    pub port: u16,
    pub keyspace: String,
    pub replication_factor: u32,
    pub local_datacenter: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub connection_timeout_secs: u64,
    pub pool_size: u32,
    pub ip_family: IpFamily,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["scylla-node".to_string()],
            port: 9042,
            keyspace: "hospital".to_string(),
            replication_factor: 1,
            local_datacenter: "datacenter1".to_string(),
            username: None,
            password: None,
            connection_timeout_secs: 15,
            pool_size: 4,
            ip_family: IpFamily::V4,
            max_retries: 5,
            retry_delay_secs: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn validate(&self) -> Result<(), HospitalError> {
        if self.hosts.iter().all(|h| h.trim().is_empty()) {
            return Err(HospitalError::Config("at least one host is required".to_string()));
        }
        if self.replication_factor == 0 {
            return Err(HospitalError::Config("replication_factor must be at least 1".to_string()));
        }
        if self.max_retries == 0 {
            return Err(HospitalError::Config("max_retries must be at least 1".to_string()));
        }
        validate_identifier(&self.keyspace)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Settings shared by every hospital service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub observability: ObservabilityConfig,
}

/// Keyspace and table names are interpolated into CQL text, so they must be
/// plain unquoted identifiers.
pub fn validate_identifier(name: &str) -> Result<(), HospitalError> {
    let valid = !name.is_empty()
        && name.len() <= 48
        && !name.starts_with('_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(HospitalError::Config(format!("invalid CQL identifier: {:?}", name)))
    }
}

pub fn split_hosts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(String::from)
        .collect()
}

/// Load a service configuration: optional YAML file, then `HOSPITAL__*`
/// environment variables, then the `SCYLLA_*` / `LOG_LEVEL` variables the
/// container images set.
pub fn load_config<T: DeserializeOwned>(path: &str) -> Result<T, HospitalError> {
    // A missing .env file is the normal case outside docker-compose.
    let _ = dotenvy::dotenv();

    let hosts = std::env::var("SCYLLA_HOSTS")
        .or_else(|_| std::env::var("SCYLLA_HOST"))
        .ok()
        .map(|raw| split_hosts(&raw))
        .filter(|hosts| !hosts.is_empty());

    let config = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("HOSPITAL")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("database.hosts")
                .try_parsing(true),
        )
        .set_override_option("database.hosts", hosts)?
        .set_override_option("database.port", env_number("SCYLLA_PORT")?)?
        .set_override_option("database.keyspace", std::env::var("SCYLLA_KEYSPACE").ok())?
        .set_override_option(
            "database.replication_factor",
            env_number("SCYLLA_REPLICATION_FACTOR")?,
        )?
        .set_override_option("observability.log_level", std::env::var("LOG_LEVEL").ok())?
        .build()?;

    Ok(config.try_deserialize()?)
}

fn env_number(key: &str) -> Result<Option<i64>, HospitalError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|e| HospitalError::Config(format!("{} must be a number: {}", key, e))),
        Err(_) => Ok(None),
    }
}
