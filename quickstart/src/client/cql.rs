//! [`ClusterClient`] backed by the `scylla` CQL driver.

use std::sync::Arc;

use async_trait::async_trait;
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::client::PoolSize;
use scylla::errors::{DbError, ExecutionError, RequestAttemptError};
use scylla::policies::host_filter::AllowListHostFilter;
use scylla::statement::batch::{Batch, BatchType};
use scylla::statement::unprepared::Statement;
use scylla::statement::Consistency;
use tracing::{debug, info, warn};

use super::{ClusterClient, Connector, DropOutcome};
use crate::config::{ClientConfig, DiscoveryMode};
use crate::errors::ScyllaClientError;
use crate::mutation::MutationBatch;
use crate::schema::{
    create_column_family_statement, create_keyspace_statement, drop_keyspace_statement,
    insert_cell_statement, ColumnFamily, ReplicationConfig,
};

/// Opens [`ScyllaClient`]s with the driver's [`SessionBuilder`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScyllaConnector;

#[async_trait]
impl Connector for ScyllaConnector {
    type Error = ScyllaClientError;
    type Client = ScyllaClient;

    async fn connect(&self, config: &ClientConfig) -> Result<ScyllaClient, ScyllaClientError> {
        let seed = config.seed();

        let mut builder = SessionBuilder::new()
            .known_node(&seed)
            .connection_timeout(config.connection_timeout())
            .pool_size(PoolSize::PerHost(config.max_conns_per_host()))
            .auto_await_schema_agreement(true);

        if config.discovery() == DiscoveryMode::SeedsOnly {
            let filter = AllowListHostFilter::new([seed.as_str()])
                .map_err(ScyllaClientError::HostFilter)?;
            builder = builder.host_filter(Arc::new(filter));
        }

        info!(
            cluster = config.cluster_name(),
            pool = config.pool_name(),
            seed = %seed,
            discovery = %config.discovery(),
            max_conns_per_host = config.max_conns_per_host().get(),
            "Connecting to cluster"
        );
        let session = builder.build().await?;

        let client = ScyllaClient {
            session,
            pool_name: config.pool_name().to_owned(),
            write_consistency: config.write_consistency(),
        };
        client.log_server_versions(config).await;

        Ok(client)
    }
}

/// A connected driver [`Session`].
#[derive(Debug)]
pub struct ScyllaClient {
    session: Session,
    pool_name: String,
    write_consistency: Consistency,
}

impl ScyllaClient {
    /// The underlying session, e.g. to read rows back.
    pub fn session(&self) -> &Session {
        &self.session
    }

    // Version mismatch is reported, never fatal.
    async fn log_server_versions(&self, config: &ClientConfig) {
        let result = match self
            .session
            .query_unpaged("SELECT release_version, cql_version FROM system.local", &[])
            .await
        {
            Ok(result) => result,
            Err(error) => {
                warn!(%error, "Could not read server versions");
                return;
            }
        };

        let versions = result.into_rows_result().ok().and_then(|rows| {
            rows.maybe_first_row::<(Option<String>, Option<String>)>()
                .ok()
                .flatten()
        });
        let Some((release_version, cql_version)) = versions else {
            warn!("system.local returned no version row");
            return;
        };
        let release_version = release_version.unwrap_or_default();
        let cql_version = cql_version.unwrap_or_default();

        info!(
            release_version = %release_version,
            cql_version = %cql_version,
            "Connected"
        );
        if !release_version.starts_with(config.target_version()) {
            warn!(
                target = config.target_version(),
                actual = %release_version,
                "Server release differs from the targeted version"
            );
        }
        if cql_version != config.cql_version() {
            debug!(
                expected = config.cql_version(),
                actual = %cql_version,
                "Server speaks a different CQL version"
            );
        }
    }
}

#[async_trait]
impl ClusterClient for ScyllaClient {
    type Error = ScyllaClientError;

    async fn drop_keyspace_if_exists(
        &self,
        keyspace: &str,
    ) -> Result<DropOutcome, ScyllaClientError> {
        match self
            .session
            .query_unpaged(drop_keyspace_statement(keyspace), &[])
            .await
        {
            Ok(_) => Ok(DropOutcome::Dropped),
            Err(error) if is_missing_keyspace(&error) => {
                debug!(%error, keyspace, "Keyspace did not exist");
                Ok(DropOutcome::Absent)
            }
            Err(error) => Err(error.into()),
        }
    }

    async fn create_keyspace(
        &self,
        keyspace: &str,
        replication: &ReplicationConfig,
    ) -> Result<(), ScyllaClientError> {
        self.session
            .query_unpaged(create_keyspace_statement(keyspace, replication), &[])
            .await?;
        Ok(())
    }

    async fn create_column_family(
        &self,
        keyspace: &str,
        column_family: &ColumnFamily,
    ) -> Result<(), ScyllaClientError> {
        self.session
            .query_unpaged(create_column_family_statement(keyspace, column_family), &[])
            .await?;
        Ok(())
    }

    async fn execute_batch(&self, batch: &MutationBatch) -> Result<(), ScyllaClientError> {
        let (cql_batch, values) = build_batch(batch, self.write_consistency);
        if values.is_empty() {
            return Ok(());
        }
        self.session.batch(&cql_batch, values).await?;
        Ok(())
    }

    async fn close(self) -> Result<(), ScyllaClientError> {
        let metrics = self.session.get_metrics();
        info!(
            pool = %self.pool_name,
            queries = metrics.get_queries_num(),
            errors = metrics.get_errors_num(),
            "Closing session"
        );
        // Connections are torn down when the session is dropped.
        drop(self.session);
        Ok(())
    }
}

/// Unlogged batch with one `INSERT` per cell, plus the bound values.
fn build_batch(
    batch: &MutationBatch,
    consistency: Consistency,
) -> (Batch, Vec<(&str, &str, &str)>) {
    let mut cql_batch = Batch::new(BatchType::Unlogged);
    cql_batch.set_consistency(consistency);

    let mut values = Vec::with_capacity(batch.cell_count());
    for (column_family, key, column, value) in batch.cells() {
        cql_batch.append_statement(Statement::new(insert_cell_statement(
            batch.keyspace(),
            column_family,
        )));
        values.push((key, column, value));
    }

    (cql_batch, values)
}

/// True only for the "keyspace does not exist" answer to `DROP KEYSPACE`.
///
/// Cassandra reports it as a configuration error, Scylla as either a
/// configuration or an invalid-request error; other errors of those kinds are
/// real failures and must not be absorbed.
fn is_missing_keyspace(error: &ExecutionError) -> bool {
    const ABSENCE_MESSAGES: [&str; 4] = [
        "non existing keyspace",
        "non-existing keyspace",
        "does not exist",
        "doesn't exist",
    ];

    match error {
        ExecutionError::LastAttemptError(RequestAttemptError::DbError(
            DbError::ConfigError | DbError::Invalid,
            message,
        )) => {
            let message = message.to_ascii_lowercase();
            ABSENCE_MESSAGES.iter().any(|m| message.contains(m))
        }
        _ => false,
    }
}
