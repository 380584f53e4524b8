use anyhow::Result;
use hospitalkit::config::{DatabaseConfig, ObservabilityConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

pub fn load_config(path: &str) -> Result<ApiConfig> {
    Ok(hospitalkit::config::load_config(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_section_is_optional() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"database": {"keyspace": "clinic"}}"#).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.keyspace, "clinic");
        assert_eq!(config.observability.log_level, "info");
    }
}
