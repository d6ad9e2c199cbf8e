//! In-memory [`Connector`] / [`ClusterClient`] pair for unit tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{ClusterClient, Connector, DropOutcome};
use crate::config::ClientConfig;
use crate::mutation::MutationBatch;
use crate::schema::{ColumnFamily, ReplicationConfig};

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

/// Rows of a column family: key -> column -> value.
pub(crate) type Rows = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FakeKeyspace {
    pub(crate) replication: ReplicationConfig,
    pub(crate) tables: BTreeMap<String, Rows>,
}

/// Every call the workflow made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect,
    DropKeyspace(String),
    CreateKeyspace(String),
    CreateColumnFamily(String, String),
    ExecuteBatch { cells: usize },
    Close,
}

/// Operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum FailPoint {
    Drop,
    CreateKeyspace,
    CreateColumnFamily,
    Batch,
    Close,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeError {
    #[error("Connection refused")]
    Unreachable,
    #[error("Injected failure at {0:?}")]
    Injected(FailPoint),
    #[error("Keyspace {0} already exists")]
    AlreadyExists(String),
    #[error("Keyspace {0} does not exist")]
    MissingKeyspace(String),
    #[error("Unconfigured table {0}")]
    MissingTable(String),
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub(crate) keyspaces: BTreeMap<String, FakeKeyspace>,
    pub(crate) calls: Vec<Call>,
    pub(crate) open_handles: usize,
    failures: HashSet<FailPoint>,
}

/// Shared cluster state; clones observe the same data.
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeCluster {
    state: Arc<Mutex<FakeState>>,
    unreachable: bool,
}

impl FakeCluster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unreachable() -> Self {
        FakeCluster {
            unreachable: true,
            ..Self::default()
        }
    }

    pub(crate) fn fail_at(&self, point: FailPoint) {
        self.state().failures.insert(point);
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn keyspaces(&self) -> BTreeMap<String, FakeKeyspace> {
        self.state().keyspaces.clone()
    }

    pub(crate) fn rows(&self, keyspace: &str, column_family: &str) -> Option<Rows> {
        self.state()
            .keyspaces
            .get(keyspace)?
            .tables
            .get(column_family)
            .cloned()
    }

    /// Seeds a keyspace, e.g. left over from an earlier run.
    pub(crate) fn insert_keyspace(&self, name: &str, tables: BTreeMap<String, Rows>) {
        self.state().keyspaces.insert(
            name.to_owned(),
            FakeKeyspace {
                replication: ReplicationConfig::default(),
                tables,
            },
        );
    }
}

#[async_trait]
impl Connector for FakeCluster {
    type Error = FakeError;
    type Client = FakeClient;

    async fn connect(&self, _config: &ClientConfig) -> Result<FakeClient, FakeError> {
        let mut state = self.state();
        state.calls.push(Call::Connect);
        if self.unreachable {
            return Err(FakeError::Unreachable);
        }
        state.open_handles += 1;
        Ok(FakeClient {
            state: Arc::clone(&self.state),
        })
    }
}

#[derive(Debug)]
pub(crate) struct FakeClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeClient {
    fn record(&self, call: Call, point: FailPoint) -> Result<MutexGuard<'_, FakeState>, FakeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failures.contains(&point) {
            return Err(FakeError::Injected(point));
        }
        Ok(state)
    }
}

#[async_trait]
impl ClusterClient for FakeClient {
    type Error = FakeError;

    async fn drop_keyspace_if_exists(&self, keyspace: &str) -> Result<DropOutcome, FakeError> {
        let mut state = self.record(Call::DropKeyspace(keyspace.to_owned()), FailPoint::Drop)?;
        Ok(match state.keyspaces.remove(keyspace) {
            Some(_) => DropOutcome::Dropped,
            None => DropOutcome::Absent,
        })
    }

    async fn create_keyspace(
        &self,
        keyspace: &str,
        replication: &ReplicationConfig,
    ) -> Result<(), FakeError> {
        let mut state = self.record(
            Call::CreateKeyspace(keyspace.to_owned()),
            FailPoint::CreateKeyspace,
        )?;
        if state.keyspaces.contains_key(keyspace) {
            return Err(FakeError::AlreadyExists(keyspace.to_owned()));
        }
        state.keyspaces.insert(
            keyspace.to_owned(),
            FakeKeyspace {
                replication: replication.clone(),
                tables: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn create_column_family(
        &self,
        keyspace: &str,
        column_family: &ColumnFamily,
    ) -> Result<(), FakeError> {
        let mut state = self.record(
            Call::CreateColumnFamily(keyspace.to_owned(), column_family.name().to_owned()),
            FailPoint::CreateColumnFamily,
        )?;
        let ks = state
            .keyspaces
            .get_mut(keyspace)
            .ok_or_else(|| FakeError::MissingKeyspace(keyspace.to_owned()))?;
        if ks.tables.contains_key(column_family.name()) {
            return Err(FakeError::AlreadyExists(column_family.name().to_owned()));
        }
        ks.tables.insert(column_family.name().to_owned(), Rows::new());
        Ok(())
    }

    async fn execute_batch(&self, batch: &MutationBatch) -> Result<(), FakeError> {
        let mut state = self.record(
            Call::ExecuteBatch {
                cells: batch.cell_count(),
            },
            FailPoint::Batch,
        )?;
        let ks = state
            .keyspaces
            .get_mut(batch.keyspace())
            .ok_or_else(|| FakeError::MissingKeyspace(batch.keyspace().to_owned()))?;

        // The whole request is rejected if any table is unknown.
        if let Some(row) = batch
            .rows()
            .iter()
            .find(|row| !ks.tables.contains_key(row.column_family()))
        {
            return Err(FakeError::MissingTable(row.column_family().to_owned()));
        }
        for (column_family, key, column, value) in batch.cells() {
            ks.tables
                .get_mut(column_family)
                .expect("checked above")
                .entry(key.to_owned())
                .or_default()
                .insert(column.to_owned(), value.to_owned());
        }
        Ok(())
    }

    async fn close(self) -> Result<(), FakeError> {
        // The handle is consumed even when closing reports an error.
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Close);
        state.open_handles -= 1;
        if state.failures.contains(&FailPoint::Close) {
            return Err(FakeError::Injected(FailPoint::Close));
        }
        Ok(())
    }
}
