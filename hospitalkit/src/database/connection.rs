use std::collections::HashSet;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use scylla::serialize::row::SerializeRow;
use scylla::statement::Consistency;
use scylla::transport::execution_profile::ExecutionProfile;
use scylla::transport::load_balancing::DefaultPolicy;
use scylla::transport::session::PoolSize;
use scylla::{CachingSession, QueryResult, Session, SessionBuilder};
use tracing::{debug, error, info};

use crate::config::{DatabaseConfig, IpFamily, REQUEST_TIMEOUT};
use crate::database::retry::RetryPolicy;
use crate::errors::HospitalError;
use crate::metrics::ACTIVE_CONNECTIONS;
use crate::types::RowData;

/// Prepared statements kept per session. The hospital tables need a few
/// dozen distinct statements at most.
const STATEMENT_CACHE_SIZE: usize = 256;

/// Shared ScyllaDB session. Clones share one underlying session, which the
/// driver makes safe for concurrent requests.
#[derive(Clone)]
pub struct ScyllaConnection {
    session: Arc<CachingSession>,
    keyspace: String,
}

impl ScyllaConnection {
    /// Open a session with a single attempt and verify it with a trivial read.
    pub async fn new(config: &DatabaseConfig) -> Result<Self, HospitalError> {
        info!("Connecting to ScyllaDB cluster: {:?}:{}", config.hosts, config.port);

        let contact_points = resolve_contact_points(config).await?;

        let policy = DefaultPolicy::builder()
            .prefer_datacenter(config.local_datacenter.clone())
            .token_aware(true)
            .build();

        let profile = ExecutionProfile::builder()
            .load_balancing_policy(policy)
            .consistency(Consistency::One)
            .request_timeout(Some(REQUEST_TIMEOUT))
            .build();

        let pool_size = NonZeroUsize::new(config.pool_size as usize).unwrap_or(NonZeroUsize::MIN);

        let mut session_builder = SessionBuilder::new()
            .known_nodes_addr(&contact_points)
            .connection_timeout(config.connection_timeout())
            .pool_size(PoolSize::PerShard(pool_size))
            .default_execution_profile_handle(profile.into_handle());

        if let (Some(ref username), Some(ref password)) = (&config.username, &config.password) {
            session_builder = session_builder.user(username, password);
        }

        let session: Session = session_builder.build().await.map_err(|e| {
            error!("Failed to connect to ScyllaDB: {}", e);
            HospitalError::from(e)
        })?;

        let connection = Self {
            session: Arc::new(CachingSession::from(session, STATEMENT_CACHE_SIZE)),
            keyspace: config.keyspace.clone(),
        };

        let version = connection
            .release_version()
            .await
            .map_err(|e| HospitalError::Connection(format!("Connectivity check failed: {}", e)))?;
        info!(
            "Connected to ScyllaDB version: {}",
            version.as_deref().unwrap_or("unknown")
        );

        Ok(connection)
    }

    /// Keyspace the hospital tables live in.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Execute a query without bind values.
    pub async fn execute_simple(&self, query: &str) -> Result<QueryResult, HospitalError> {
        debug!("CQL: {}", query.trim());
        Ok(self.session.get_session().query_unpaged(query, ()).await?)
    }

    /// Execute a parameterized statement, preparing it on first use.
    pub async fn execute_with_values<V: SerializeRow>(
        &self,
        query: &str,
        values: V,
    ) -> Result<QueryResult, HospitalError> {
        debug!("CQL: {}", query.trim());
        Ok(self.session.execute_unpaged(query, values).await?)
    }

    /// Run a parameterized `SELECT` and return its rows by column name.
    pub async fn fetch<V: SerializeRow>(
        &self,
        query: &str,
        values: V,
    ) -> Result<Vec<RowData>, HospitalError> {
        let result = self.execute_with_values(query, values).await?;
        Ok(into_rows(result))
    }

    /// Run a `SELECT` without bind values.
    pub async fn fetch_simple(&self, query: &str) -> Result<Vec<RowData>, HospitalError> {
        let result = self.execute_simple(query).await?;
        Ok(into_rows(result))
    }

    pub async fn use_keyspace(&self, keyspace: &str) -> Result<(), HospitalError> {
        Ok(self.session.get_session().use_keyspace(keyspace, false).await?)
    }

    pub async fn release_version(&self) -> Result<Option<String>, HospitalError> {
        let rows = self
            .fetch_simple("SELECT release_version FROM system.local")
            .await?;
        Ok(rows.first().and_then(|row| row.text("release_version")))
    }

    pub async fn health_check(&self) -> Result<(), HospitalError> {
        self.execute_simple("SELECT now() FROM system.local")
            .await
            .map_err(|e| HospitalError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

fn into_rows(result: QueryResult) -> Vec<RowData> {
    let specs = result.col_specs().to_vec();
    result
        .rows
        .unwrap_or_default()
        .into_iter()
        .map(|row| RowData::from_driver_row(&specs, row))
        .collect()
}

/// Resolve every configured host, keeping only the requested address family.
async fn resolve_contact_points(config: &DatabaseConfig) -> Result<Vec<SocketAddr>, HospitalError> {
    let mut resolved = Vec::new();

    for host in config.hosts.iter().map(|h| h.trim()).filter(|h| !h.is_empty()) {
        match tokio::net::lookup_host((host, config.port)).await {
            Ok(addrs) => {
                let addrs = filter_family(addrs, config.ip_family);
                debug!("Resolved {} to {:?}", host, addrs);
                resolved.extend(addrs);
            }
            Err(e) => error!("Failed to resolve {}: {}", host, e),
        }
    }

    let resolved = unique_addresses(resolved);
    if resolved.is_empty() {
        return Err(HospitalError::Connection(format!(
            "No {:?} addresses found for {:?}",
            config.ip_family, config.hosts
        )));
    }
    Ok(resolved)
}

pub fn filter_family(addrs: impl IntoIterator<Item = SocketAddr>, family: IpFamily) -> Vec<SocketAddr> {
    addrs
        .into_iter()
        .filter(|addr| family == IpFamily::Any || addr.is_ipv4())
        .collect()
}

/// Drop repeated addresses, keeping the first occurrence of each.
pub fn unique_addresses(addrs: Vec<SocketAddr>) -> Vec<SocketAddr> {
    let mut seen = HashSet::new();
    addrs.into_iter().filter(|addr| seen.insert(*addr)).collect()
}

/// Owns the process-wide connection: opens it with bounded retries and
/// releases it on `close`.
pub struct ConnectionManager {
    config: DatabaseConfig,
    connection: Option<Arc<ScyllaConnection>>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Connect using the retry settings from the configuration.
    pub async fn connect_default(&mut self) -> Result<Arc<ScyllaConnection>, HospitalError> {
        let (retries, delay) = (self.config.max_retries, self.config.retry_delay());
        self.connect(retries, delay).await
    }

    /// Connect, retrying up to `max_retries` attempts with `retry_delay`
    /// between them. Returns the existing session if already connected.
    pub async fn connect(
        &mut self,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Arc<ScyllaConnection>, HospitalError> {
        if let Some(connection) = &self.connection {
            return Ok(connection.clone());
        }

        self.config.validate()?;

        let policy = RetryPolicy::fixed(max_retries, retry_delay);
        let config = &self.config;
        let connection = policy
            .execute(move || ScyllaConnection::new(config))
            .await
            .map_err(|e| {
                HospitalError::Connection(format!(
                    "Failed to connect to ScyllaDB after {} attempts: {}",
                    policy.max_attempts(),
                    e
                ))
            })?;

        let connection = Arc::new(connection);
        self.connection = Some(connection.clone());
        ACTIVE_CONNECTIONS.inc();
        Ok(connection)
    }

    pub fn connection(&self) -> Option<Arc<ScyllaConnection>> {
        self.connection.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Drop the manager's session. Connections handed out earlier keep the
    /// session alive until they are dropped too. No-op when never connected.
    pub fn close(&mut self) {
        if self.connection.take().is_some() {
            ACTIVE_CONNECTIONS.dec();
            info!("Database connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_filter_family_keeps_ipv4() {
        let v4 = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(172, 17, 0, 2)), 9042);
        let v6 = SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 9042);

        assert_eq!(filter_family([v4, v6], IpFamily::V4), vec![v4]);
        assert_eq!(filter_family([v4, v6], IpFamily::Any), vec![v4, v6]);
        assert!(filter_family([v6], IpFamily::V4).is_empty());
    }

    #[test]
    fn test_close_without_connect() {
        let mut manager = ConnectionManager::new(DatabaseConfig::default());
        assert!(!manager.is_connected());
        manager.close();
        manager.close();
        assert!(manager.connection().is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let mut config = DatabaseConfig::default();
        config.keyspace = "bad keyspace".to_string();
        let mut manager = ConnectionManager::new(config);

        let result = manager.connect(1, Duration::ZERO).await;
        assert!(matches!(result, Err(HospitalError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_fails_after_retries() {
        let mut config = DatabaseConfig::default();
        config.hosts = vec!["host.invalid".to_string()];
        let mut manager = ConnectionManager::new(config);

        let result = manager.connect(2, Duration::from_millis(10)).await;
        match result {
            Err(HospitalError::Connection(msg)) => assert!(msg.contains("after 2 attempts")),
            other => panic!("expected connection error, got {:?}", other.map(|_| ())),
        }
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_unique_addresses_keeps_first_occurrence() {
        let a = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)), 9042);
        let b = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 6)), 9042);

        assert_eq!(unique_addresses(vec![a, b, a, b, a]), vec![a, b]);
        assert!(unique_addresses(Vec::new()).is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires running ScyllaDB instance
    async fn test_connect_and_health_check() {
        let mut config = DatabaseConfig::default();
        config.hosts = vec![std::env::var("SCYLLA_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())];
        let mut manager = ConnectionManager::new(config);

        let connection = manager.connect(3, Duration::from_secs(1)).await.unwrap();
        assert!(connection.health_check().await.is_ok());

        let version = connection.release_version().await.unwrap();
        assert!(version.is_some_and(|v| !v.is_empty()));

        // Same statement twice goes through the prepared-statement cache.
        for _ in 0..2 {
            let rows = connection
                .fetch(
                    "SELECT release_version FROM system.local WHERE key = ?",
                    ("local",),
                )
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
            assert!(rows[0].text("release_version").is_some());
        }
        manager.close();
        assert!(!manager.is_connected());
    }
}
