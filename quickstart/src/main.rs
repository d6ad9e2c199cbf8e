//! Recreates `Keyspace0`/`Standard1` on the cluster named by `SCYLLA_URI`
//! (default `127.0.0.1:9042`) and writes the example rows.

use anyhow::Result;
use quickstart::client::{DropOutcome, ScyllaConnector};
use quickstart::config::ClientConfig;
use quickstart::workflow;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

// Log level is taken from RUST_LOG, e.g.
// RUST_LOG=quickstart=debug,scylla=info cargo run
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env()?;

    match workflow::run(&ScyllaConnector, &config).await {
        Ok(summary) => {
            info!(
                keyspace = config.keyspace(),
                column_family = config.column_family(),
                recreated = summary.previous_keyspace == DropOutcome::Dropped,
                rows = summary.rows_written,
                cells = summary.cells_written,
                "Done"
            );
            Ok(())
        }
        Err(err) => {
            let err = anyhow::Error::from(err);
            error!(error = ?err, "Run failed");
            Err(err)
        }
    }
}
