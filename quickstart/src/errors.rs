//! Error types returned by the quickstart library.

use std::fmt;

use scylla::errors::{ExecutionError, NewSessionError};
use thiserror::Error;

/// An invalid [`ClientConfig`](crate::config::ClientConfig) was requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// The seed host is empty.
    #[error("Seed host is empty")]
    EmptyHost,

    /// Port 0 was given for the seed node.
    #[error("Seed port must be non-zero")]
    ZeroPort,

    /// `SCYLLA_URI` (or a seed string) is not of the form `host:port`.
    #[error("Seed address '{0}' is not of the form host:port")]
    BadSeedAddress(String),

    /// Keyspace or column family name violates CQL identifier rules.
    #[error(transparent)]
    BadIdentifier(#[from] BadIdentifier),

    /// Replication factor of zero, or a topology strategy without datacenters.
    #[error("Invalid replication settings: {0}")]
    BadReplication(String),
}

/// Invalid keyspace or column family name.
///
/// Names are quoted in generated CQL, so case is preserved, but they must still
/// be valid unquoted identifiers: non-empty, at most 48 characters, ASCII
/// alphanumerics and underscores only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BadIdentifier {
    /// Name is empty
    #[error("{kind} name is empty")]
    Empty {
        /// What the name identifies
        kind: IdentifierKind,
    },

    /// Name too long, must be up to 48 characters
    #[error("{kind} name too long, must be up to 48 characters, found {length} characters. Bad name: '{name}'")]
    TooLong {
        /// What the name identifies
        kind: IdentifierKind,
        /// Offending name
        name: String,
        /// Its length in characters
        length: usize,
    },

    /// Illegal character - only alphanumeric and underscores allowed.
    #[error("Illegal character found: '{character}', only alphanumeric and underscores allowed. Bad {kind} name: '{name}'")]
    IllegalCharacter {
        /// What the name identifies
        kind: IdentifierKind,
        /// Offending name
        name: String,
        /// First illegal character
        character: char,
    },
}

/// What a validated identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    /// A keyspace
    Keyspace,
    /// A column family (table)
    ColumnFamily,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Keyspace => f.write_str("Keyspace"),
            IdentifierKind::ColumnFamily => f.write_str("Column family"),
        }
    }
}

/// Error returned by the CQL-backed client.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ScyllaClientError {
    /// Session could not be established, e.g. the seed node is unreachable.
    #[error("Failed to connect to the cluster: {0}")]
    Connect(#[from] NewSessionError),

    /// A request failed after the driver gave up on it.
    #[error("Request failed: {0}")]
    Execution(#[from] ExecutionError),

    /// The seed-only host filter could not resolve the seed address.
    #[error("Failed to resolve seed address for host filter: {0}")]
    HostFilter(#[source] std::io::Error),
}

/// Workflow step that failed while preparing the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStep {
    /// Dropping the previous keyspace
    DropKeyspace,
    /// Creating the keyspace
    CreateKeyspace,
    /// Creating the column family
    CreateColumnFamily,
}

impl fmt::Display for SchemaStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaStep::DropKeyspace => f.write_str("dropping keyspace"),
            SchemaStep::CreateKeyspace => f.write_str("creating keyspace"),
            SchemaStep::CreateColumnFamily => f.write_str("creating column family"),
        }
    }
}

/// Fatal error of a [`run`](crate::workflow::run).
///
/// Generic over the client's error type so that any
/// [`ClusterClient`](crate::client::ClusterClient) can drive the workflow.
#[derive(Error, Debug)]
pub enum WorkflowError<E: std::error::Error + 'static> {
    /// The cluster could not be reached; nothing was attempted.
    #[error("Could not connect to cluster '{cluster}': {source}")]
    Connect {
        /// Configured cluster name
        cluster: String,
        /// Underlying client error
        #[source]
        source: E,
    },

    /// A schema statement failed. Absence of the keyspace on drop is not an error.
    #[error("Schema setup failed while {step}: {source}")]
    Schema {
        /// Failing step
        step: SchemaStep,
        /// Underlying client error
        #[source]
        source: E,
    },

    /// The mutation batch was rejected or the connection failed mid-batch.
    #[error("Batch of {rows} rows failed: {source}")]
    Batch {
        /// Rows in the rejected batch
        rows: usize,
        /// Underlying client error
        #[source]
        source: E,
    },

    /// Releasing the handle failed after an otherwise successful run.
    #[error("Failed to close the client: {0}")]
    Close(#[source] E),
}
