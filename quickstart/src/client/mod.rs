//! The narrow seam between the workflow and the database driver.
//!
//! The workflow only ever needs to connect, drop and create schema objects,
//! execute one batch and release the handle. Anything implementing
//! [`Connector`] and [`ClusterClient`] can stand in for the CQL driver.

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::mutation::MutationBatch;
use crate::schema::{ColumnFamily, ReplicationConfig};

mod cql;
pub use cql::{ScyllaClient, ScyllaConnector};

/// Result of [`ClusterClient::drop_keyspace_if_exists`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// The keyspace existed and was dropped.
    Dropped,
    /// There was nothing to drop.
    Absent,
}

/// Produces connected [`ClusterClient`]s.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Error reported by the connector and its clients.
    type Error: std::error::Error + Send + Sync + 'static;
    /// Connected handle type.
    type Client: ClusterClient<Error = Self::Error>;

    /// Connects to the cluster described by `config`.
    ///
    /// Fails if the cluster cannot be reached; no retry is attempted.
    async fn connect(&self, config: &ClientConfig) -> Result<Self::Client, Self::Error>;
}

/// A live connection to a cluster.
///
/// Operations are awaited one at a time by the workflow. The handle is given
/// back through [`ClusterClient::close`] on every path out of a run.
#[async_trait]
pub trait ClusterClient: Send + Sync + Sized {
    /// Error reported by every operation.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Drops `keyspace`. A keyspace that does not exist yields
    /// [`DropOutcome::Absent`]; every other failure is an error.
    async fn drop_keyspace_if_exists(&self, keyspace: &str) -> Result<DropOutcome, Self::Error>;

    /// Creates `keyspace` with the given replication settings.
    async fn create_keyspace(
        &self,
        keyspace: &str,
        replication: &ReplicationConfig,
    ) -> Result<(), Self::Error>;

    /// Creates `column_family` inside `keyspace`.
    async fn create_column_family(
        &self,
        keyspace: &str,
        column_family: &ColumnFamily,
    ) -> Result<(), Self::Error>;

    /// Sends every mutation of `batch` in one request.
    async fn execute_batch(&self, batch: &MutationBatch) -> Result<(), Self::Error>;

    /// Releases the handle.
    async fn close(self) -> Result<(), Self::Error>;
}
