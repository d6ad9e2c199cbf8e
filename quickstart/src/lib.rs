//! Getting-started example for a Cassandra-compatible cluster.
//!
//! The example connects to a cluster, drops and recreates a keyspace and a
//! column family in it, then writes a few rows with a single batched request.
//! Everything that makes talking to a cluster hard (pooling, ring discovery,
//! retries, consistency) is left to the [`scylla`] driver.
//!
//! # Overview
//! ```rust,no_run
//! use quickstart::client::ScyllaConnector;
//! use quickstart::config::ClientConfig;
//! use quickstart::workflow;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let summary = workflow::run(&ScyllaConnector, &config).await?;
//! println!("wrote {} rows", summary.rows_written);
//! # Ok(())
//! # }
//! ```
//!
//! After a run, `cqlsh` shows:
//! ```text
//! cqlsh> SELECT * FROM "Keyspace0"."Standard1";
//!
//!  key  | column1 | value
//! ------+---------+-------
//!  4567 | Column1 |     X
//!  4567 | Column2 |     X
//!  4567 | Column3 |     X
//!  1234 | Column1 |     X
//!  1234 | Column2 |     X
//! ```
//!
//! The workflow talks to the cluster only through [`client::Connector`] and
//! [`client::ClusterClient`], so the driver can be replaced without touching it.

pub mod client;
pub mod config;
pub mod errors;
pub mod mutation;
pub mod schema;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ScyllaClient, ScyllaConnector};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use workflow::{run, RunSummary};
