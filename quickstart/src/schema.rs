//! Keyspace and column family definitions, and the CQL that creates them.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use crate::config::validate_identifier;
use crate::errors::{BadIdentifier, ConfigError, IdentifierKind};

/// Replica placement strategy of a keyspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationStrategy {
    /// `SimpleStrategy`: one replication factor for the whole cluster.
    Simple {
        /// Number of replicas
        replication_factor: NonZeroU32,
    },
    /// `NetworkTopologyStrategy`: a replication factor per datacenter.
    NetworkTopology {
        /// Replicas per datacenter name
        datacenters: BTreeMap<String, NonZeroU32>,
    },
}

impl ReplicationStrategy {
    /// Strategy class name as understood by the server.
    pub fn class(&self) -> &'static str {
        match self {
            ReplicationStrategy::Simple { .. } => "SimpleStrategy",
            ReplicationStrategy::NetworkTopology { .. } => "NetworkTopologyStrategy",
        }
    }
}

/// Replication settings a keyspace is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    strategy: ReplicationStrategy,
}

impl ReplicationConfig {
    /// Single-datacenter `SimpleStrategy`.
    pub fn simple(replication_factor: NonZeroU32) -> Self {
        ReplicationConfig {
            strategy: ReplicationStrategy::Simple { replication_factor },
        }
    }

    /// `NetworkTopologyStrategy` with the given per-datacenter factors.
    ///
    /// At least one datacenter is required.
    pub fn network_topology(
        datacenters: impl IntoIterator<Item = (String, NonZeroU32)>,
    ) -> Result<Self, ConfigError> {
        let datacenters: BTreeMap<String, NonZeroU32> = datacenters.into_iter().collect();
        if datacenters.is_empty() {
            return Err(ConfigError::BadReplication(
                "NetworkTopologyStrategy needs at least one datacenter".to_owned(),
            ));
        }
        if let Some(dc) = datacenters.keys().find(|dc| dc.is_empty() || dc.contains('\'')) {
            return Err(ConfigError::BadReplication(format!(
                "invalid datacenter name '{dc}'"
            )));
        }
        Ok(ReplicationConfig {
            strategy: ReplicationStrategy::NetworkTopology { datacenters },
        })
    }

    /// The configured strategy.
    pub fn strategy(&self) -> &ReplicationStrategy {
        &self.strategy
    }

    /// Renders the CQL `replication` map literal.
    pub fn to_cql_map(&self) -> String {
        match &self.strategy {
            ReplicationStrategy::Simple { replication_factor } => format!(
                "{{'class' : '{}', 'replication_factor' : {}}}",
                self.strategy.class(),
                replication_factor
            ),
            ReplicationStrategy::NetworkTopology { datacenters } => {
                let mut map = format!("{{'class' : '{}'", self.strategy.class());
                for (dc, factor) in datacenters {
                    map.push_str(&format!(", '{dc}' : {factor}"));
                }
                map.push('}');
                map
            }
        }
    }
}

impl Default for ReplicationConfig {
    /// `SimpleStrategy` with a replication factor of one.
    fn default() -> Self {
        ReplicationConfig::simple(NonZeroU32::MIN)
    }
}

/// Textual CQL types usable as row key, column name or value.
///
/// Rows are written as strings, so only string-compatible types are offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextType {
    /// UTF-8 `text`
    #[default]
    Text,
    /// US-ASCII `ascii`
    Ascii,
    /// Alias of `text`
    Varchar,
}

impl fmt::Display for TextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextType::Text => f.write_str("text"),
            TextType::Ascii => f.write_str("ascii"),
            TextType::Varchar => f.write_str("varchar"),
        }
    }
}

/// A column family: rows identified by key, each holding named columns.
///
/// Stored as a wide-row table `(key, column1, value)` with `key` as the
/// partition key and `column1` as clustering column, which is how a
/// column family looks to `cqlsh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamily {
    name: String,
    key_type: TextType,
    comparator_type: TextType,
    value_type: TextType,
}

impl ColumnFamily {
    /// Column family with string keys, string column names and string values.
    pub fn new_string_family(name: impl Into<String>) -> Result<Self, BadIdentifier> {
        Self::new(name, TextType::Text, TextType::Text, TextType::Text)
    }

    /// Name must already satisfy the identifier rules.
    pub(crate) fn validated_string_family(name: &str) -> Self {
        ColumnFamily {
            name: name.to_owned(),
            key_type: TextType::Text,
            comparator_type: TextType::Text,
            value_type: TextType::Text,
        }
    }

    /// Column family with explicit types.
    pub fn new(
        name: impl Into<String>,
        key_type: TextType,
        comparator_type: TextType,
        value_type: TextType,
    ) -> Result<Self, BadIdentifier> {
        let name = name.into();
        validate_identifier(&name, IdentifierKind::ColumnFamily)?;
        Ok(ColumnFamily {
            name,
            key_type,
            comparator_type,
            value_type,
        })
    }

    /// Column family name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type of the row key.
    pub fn key_type(&self) -> TextType {
        self.key_type
    }

    /// Type of column names.
    pub fn comparator_type(&self) -> TextType {
        self.comparator_type
    }

    /// Type of column values.
    pub fn value_type(&self) -> TextType {
        self.value_type
    }
}

/// Quotes an identifier so that its case is preserved.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `DROP KEYSPACE` without `IF EXISTS`, so that absence is reported.
pub fn drop_keyspace_statement(keyspace: &str) -> String {
    format!("DROP KEYSPACE {}", quote_identifier(keyspace))
}

/// `CREATE KEYSPACE` with the given replication.
pub fn create_keyspace_statement(keyspace: &str, replication: &ReplicationConfig) -> String {
    format!(
        "CREATE KEYSPACE {} WITH REPLICATION = {}",
        quote_identifier(keyspace),
        replication.to_cql_map()
    )
}

/// `CREATE TABLE` for a column family.
pub fn create_column_family_statement(keyspace: &str, cf: &ColumnFamily) -> String {
    format!(
        "CREATE TABLE {}.{} (key {}, column1 {}, value {}, PRIMARY KEY (key, column1))",
        quote_identifier(keyspace),
        quote_identifier(cf.name()),
        cf.key_type(),
        cf.comparator_type(),
        cf.value_type()
    )
}

/// Single-cell `INSERT` used for every column of a row mutation.
pub fn insert_cell_statement(keyspace: &str, column_family: &str) -> String {
    format!(
        "INSERT INTO {}.{} (key, column1, value) VALUES (?, ?, ?)",
        quote_identifier(keyspace),
        quote_identifier(column_family)
    )
}
