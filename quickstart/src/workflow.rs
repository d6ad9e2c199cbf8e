//! The example itself: connect, recreate the schema, write one batch, close.
//!
//! Each step is awaited before the next one starts. The client handle is
//! closed on every path out of [`run`] once it has been acquired, including
//! when schema setup or the batch fails.

use tracing::{debug, info, warn};

use crate::client::{ClusterClient, Connector, DropOutcome};
use crate::config::ClientConfig;
use crate::errors::{SchemaStep, WorkflowError};
use crate::mutation::MutationBatch;
use crate::schema::{ColumnFamily, ReplicationConfig};

/// What a successful [`run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Whether a keyspace from an earlier run was dropped.
    pub previous_keyspace: DropOutcome,
    /// Rows written by the batch.
    pub rows_written: usize,
    /// Columns written by the batch, across all rows.
    pub cells_written: usize,
}

/// The rows the example writes:
///
/// ```text
///  key  | column1 | value
/// ------+---------+-------
///  1234 | Column1 |     X
///  1234 | Column2 |     X
///  4567 | Column1 |     X
///  4567 | Column2 |     X
///  4567 | Column3 |     X
/// ```
pub fn example_batch(keyspace: &str, column_family: &ColumnFamily) -> MutationBatch {
    let mut batch = MutationBatch::new(keyspace);
    batch
        .with_row(column_family, "1234")
        .put_column("Column1", "X")
        .put_column("Column2", "X");
    batch
        .with_row(column_family, "4567")
        .put_column("Column1", "X")
        .put_column("Column2", "X")
        .put_column("Column3", "X");
    batch
}

/// Runs the example against the cluster described by `config`.
pub async fn run<C: Connector>(
    connector: &C,
    config: &ClientConfig,
) -> Result<RunSummary, WorkflowError<C::Error>> {
    let column_family = config.column_family_definition();
    let batch = example_batch(config.keyspace(), &column_family);
    run_with(
        connector,
        config,
        &ReplicationConfig::default(),
        &column_family,
        &batch,
    )
    .await
}

/// Like [`run`], with explicit replication, column family and rows.
pub async fn run_with<C: Connector>(
    connector: &C,
    config: &ClientConfig,
    replication: &ReplicationConfig,
    column_family: &ColumnFamily,
    batch: &MutationBatch,
) -> Result<RunSummary, WorkflowError<C::Error>> {
    let client = connector
        .connect(config)
        .await
        .map_err(|source| WorkflowError::Connect {
            cluster: config.cluster_name().to_owned(),
            source,
        })?;
    info!(cluster = config.cluster_name(), "Connected");

    let outcome = setup_and_write(&client, config, replication, column_family, batch).await;

    let closed = client.close().await;
    match (outcome, closed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(error)) => Err(WorkflowError::Close(error)),
        (Err(error), Ok(())) => Err(error),
        (Err(error), Err(close_error)) => {
            warn!(error = %close_error, "Failed to close the client after an earlier error");
            Err(error)
        }
    }
}

async fn setup_and_write<C: ClusterClient>(
    client: &C,
    config: &ClientConfig,
    replication: &ReplicationConfig,
    column_family: &ColumnFamily,
    batch: &MutationBatch,
) -> Result<RunSummary, WorkflowError<C::Error>> {
    let previous_keyspace =
        recreate_environment(client, config.keyspace(), replication, column_family).await?;
    write_batch(client, batch).await?;
    Ok(RunSummary {
        previous_keyspace,
        rows_written: batch.row_count(),
        cells_written: batch.cell_count(),
    })
}

/// Drops `keyspace` if present, then creates it and `column_family` afresh.
///
/// Returns whether an old keyspace was dropped.
pub async fn recreate_environment<C: ClusterClient>(
    client: &C,
    keyspace: &str,
    replication: &ReplicationConfig,
    column_family: &ColumnFamily,
) -> Result<DropOutcome, WorkflowError<C::Error>> {
    let previous = client
        .drop_keyspace_if_exists(keyspace)
        .await
        .map_err(|source| WorkflowError::Schema {
            step: SchemaStep::DropKeyspace,
            source,
        })?;
    match previous {
        DropOutcome::Dropped => info!(keyspace, "Dropped existing keyspace"),
        DropOutcome::Absent => debug!(keyspace, "Keyspace did not exist yet"),
    }

    client
        .create_keyspace(keyspace, replication)
        .await
        .map_err(|source| WorkflowError::Schema {
            step: SchemaStep::CreateKeyspace,
            source,
        })?;
    info!(
        keyspace,
        replication = %replication.to_cql_map(),
        "Created keyspace"
    );

    client
        .create_column_family(keyspace, column_family)
        .await
        .map_err(|source| WorkflowError::Schema {
            step: SchemaStep::CreateColumnFamily,
            source,
        })?;
    info!(
        keyspace,
        column_family = column_family.name(),
        "Created column family"
    );

    Ok(previous)
}

/// Executes `batch` in a single request. An empty batch is not sent.
pub async fn write_batch<C: ClusterClient>(
    client: &C,
    batch: &MutationBatch,
) -> Result<(), WorkflowError<C::Error>> {
    if batch.is_empty() {
        info!(keyspace = batch.keyspace(), "Nothing to write");
        return Ok(());
    }

    client
        .execute_batch(batch)
        .await
        .map_err(|source| WorkflowError::Batch {
            rows: batch.row_count(),
            source,
        })?;
    info!(
        keyspace = batch.keyspace(),
        rows = batch.row_count(),
        cells = batch.cell_count(),
        "Batch executed"
    );
    Ok(())
}
