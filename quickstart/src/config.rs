//! Connection parameters for the quickstart run.
//!
//! [`ClientConfig`] is immutable once built. Use [`ClientConfig::builder`] to
//! change any of the defaults, or [`ClientConfig::from_env`] to pick up the
//! seed address from `SCYLLA_URI` the same way the driver's examples do.

use std::env;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

use scylla::statement::Consistency;

use crate::errors::{BadIdentifier, ConfigError, IdentifierKind};
use crate::schema::ColumnFamily;

/// CQL version the example is written against.
pub const CQL_VERSION: &str = "3.4.5";
/// Cassandra release the example targets.
pub const TARGET_CASSANDRA_VERSION: &str = "4.1";
/// Cluster name reported in logs.
pub const CLUSTER_NAME: &str = "Cluster0";
/// Keyspace recreated on every run.
pub const KEYSPACE_NAME: &str = "Keyspace0";
/// Column family created inside [`KEYSPACE_NAME`].
pub const CF_NAME: &str = "Standard1";
/// Name of the connection pool, used as a logging label.
pub const CONNECTION_POOL_NAME: &str = "ConnectionPool0";
/// Seed host.
pub const HOST: &str = "127.0.0.1";
/// CQL native protocol port.
pub const PORT: u16 = 9042;

/// Environment variable overriding the seed node, as `host:port`.
pub const SEED_URI_ENV: &str = "SCYLLA_URI";

const MAX_IDENTIFIER_LENGTH: usize = 48;

/// How the client learns about the rest of the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryMode {
    /// Discover every node from the seed's view of the ring.
    #[default]
    RingDescribe,
    /// Only ever talk to the seed node.
    SeedsOnly,
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryMode::RingDescribe => f.write_str("RING_DESCRIBE"),
            DiscoveryMode::SeedsOnly => f.write_str("SEEDS_ONLY"),
        }
    }
}

/// Immutable connection configuration, constructed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    cql_version: String,
    target_version: String,
    cluster_name: String,
    keyspace: String,
    column_family: String,
    discovery: DiscoveryMode,
    pool_name: String,
    host: String,
    port: u16,
    max_conns_per_host: NonZeroUsize,
    connection_timeout: Duration,
    write_consistency: Consistency,
}

impl ClientConfig {
    /// Starts from the example's defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Default configuration with the seed overridden by `SCYLLA_URI`, if set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = ClientConfig::builder();
        if let Ok(uri) = env::var(SEED_URI_ENV) {
            builder = builder.seed(&uri)?;
        }
        builder.build()
    }

    /// CQL version the statements are written for.
    pub fn cql_version(&self) -> &str {
        &self.cql_version
    }

    /// Database release the example targets.
    pub fn target_version(&self) -> &str {
        &self.target_version
    }

    /// Cluster label.
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    /// Keyspace recreated by the run.
    pub fn keyspace(&self) -> &str {
        &self.keyspace
    }

    /// Column family created in [`Self::keyspace`].
    pub fn column_family(&self) -> &str {
        &self.column_family
    }

    /// String-typed definition of [`Self::column_family`].
    pub fn column_family_definition(&self) -> ColumnFamily {
        ColumnFamily::validated_string_family(&self.column_family)
    }

    /// Ring discovery mode.
    pub fn discovery(&self) -> DiscoveryMode {
        self.discovery
    }

    /// Connection pool label.
    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    /// Seed host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Seed port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Seed node as `host:port`, with IPv6 hosts bracketed.
    pub fn seed(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Connections kept open to every node.
    pub fn max_conns_per_host(&self) -> NonZeroUsize {
        self.max_conns_per_host
    }

    /// How long to wait for a connection to a node to be established.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    /// Consistency level the mutation batch is written with.
    pub fn write_consistency(&self) -> Consistency {
        self.write_consistency
    }
}

/// Builds a validated [`ClientConfig`].
///
/// # Example
/// ```
/// # use quickstart::config::{ClientConfig, DiscoveryMode};
/// # fn example() -> Result<(), quickstart::errors::ConfigError> {
/// let config = ClientConfig::builder()
///     .keyspace("Keyspace1")
///     .seed("10.0.0.1:9042")?
///     .discovery(DiscoveryMode::SeedsOnly)
///     .build()?;
/// assert_eq!(config.seed(), "10.0.0.1:9042");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Creates a builder holding the example's defaults.
    pub fn new() -> Self {
        ClientConfigBuilder {
            config: ClientConfig {
                cql_version: CQL_VERSION.to_owned(),
                target_version: TARGET_CASSANDRA_VERSION.to_owned(),
                cluster_name: CLUSTER_NAME.to_owned(),
                keyspace: KEYSPACE_NAME.to_owned(),
                column_family: CF_NAME.to_owned(),
                discovery: DiscoveryMode::default(),
                pool_name: CONNECTION_POOL_NAME.to_owned(),
                host: HOST.to_owned(),
                port: PORT,
                max_conns_per_host: NonZeroUsize::MIN,
                connection_timeout: Duration::from_secs(5),
                write_consistency: Consistency::One,
            },
        }
    }

    /// Sets the CQL version.
    pub fn cql_version(mut self, version: impl Into<String>) -> Self {
        self.config.cql_version = version.into();
        self
    }

    /// Sets the targeted database release.
    pub fn target_version(mut self, version: impl Into<String>) -> Self {
        self.config.target_version = version.into();
        self
    }

    /// Sets the cluster label.
    pub fn cluster_name(mut self, name: impl Into<String>) -> Self {
        self.config.cluster_name = name.into();
        self
    }

    /// Sets the keyspace to recreate.
    pub fn keyspace(mut self, name: impl Into<String>) -> Self {
        self.config.keyspace = name.into();
        self
    }

    /// Sets the column family to create.
    pub fn column_family(mut self, name: impl Into<String>) -> Self {
        self.config.column_family = name.into();
        self
    }

    /// Sets the discovery mode.
    pub fn discovery(mut self, mode: DiscoveryMode) -> Self {
        self.config.discovery = mode;
        self
    }

    /// Sets the connection pool label.
    pub fn pool_name(mut self, name: impl Into<String>) -> Self {
        self.config.pool_name = name.into();
        self
    }

    /// Sets the seed host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the seed port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a `host:port` string.
    ///
    /// IPv6 hosts must be bracketed, e.g. `[::1]:9042`.
    pub fn seed(mut self, seed: &str) -> Result<Self, ConfigError> {
        let (host, port) = parse_seed(seed)?;
        self.config.host = host;
        self.config.port = port;
        Ok(self)
    }

    /// Sets how many connections are opened to each node.
    pub fn max_conns_per_host(mut self, conns: NonZeroUsize) -> Self {
        self.config.max_conns_per_host = conns;
        self
    }

    /// Sets the per-node connection timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.config.connection_timeout = timeout;
        self
    }

    /// Sets the consistency level of the mutation batch.
    pub fn write_consistency(mut self, consistency: Consistency) -> Self {
        self.config.write_consistency = consistency;
        self
    }

    /// Validates the collected parameters.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let config = self.config;
        if config.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if config.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        validate_identifier(&config.keyspace, IdentifierKind::Keyspace)?;
        validate_identifier(&config.column_family, IdentifierKind::ColumnFamily)?;
        Ok(config)
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_seed(seed: &str) -> Result<(String, u16), ConfigError> {
    let bad = || ConfigError::BadSeedAddress(seed.to_owned());

    let (host, port) = seed.rsplit_once(':').ok_or_else(bad)?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(ConfigError::EmptyHost);
    }
    let port: u16 = port.parse().map_err(|_| bad())?;
    if port == 0 {
        return Err(ConfigError::ZeroPort);
    }

    Ok((host.to_owned(), port))
}

/// Checks the CQL identifier rules for keyspace and table names.
pub(crate) fn validate_identifier(name: &str, kind: IdentifierKind) -> Result<(), BadIdentifier> {
    if name.is_empty() {
        return Err(BadIdentifier::Empty { kind });
    }

    let length = name.chars().count();
    if length > MAX_IDENTIFIER_LENGTH {
        return Err(BadIdentifier::TooLong {
            kind,
            name: name.to_owned(),
            length,
        });
    }

    if let Some(character) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
    {
        return Err(BadIdentifier::IllegalCharacter {
            kind,
            name: name.to_owned(),
            character,
        });
    }

    Ok(())
}
