use std::net::TcpListener;
use std::time::Duration;

use assert_matches::assert_matches;
use quickstart::client::Connector;
use quickstart::config::{ClientConfig, DiscoveryMode};
use quickstart::errors::{ScyllaClientError, WorkflowError};
use quickstart::workflow;
use quickstart::ScyllaConnector;

use crate::utils::setup_tracing;

/// A local port that nothing listens on.
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn unreachable_cluster_fails_before_any_schema_work() {
    setup_tracing();
    let config = ClientConfig::builder()
        .host("127.0.0.1")
        .port(closed_port())
        .connection_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = workflow::run(&ScyllaConnector, &config).await.unwrap_err();

    assert_matches!(
        err,
        WorkflowError::Connect {
            source: ScyllaClientError::Connect(_),
            ..
        }
    );
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn seeds_only_discovery_still_needs_a_reachable_seed() {
    setup_tracing();
    let config = ClientConfig::builder()
        .host("127.0.0.1")
        .port(closed_port())
        .discovery(DiscoveryMode::SeedsOnly)
        .connection_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = workflow::run(&ScyllaConnector, &config).await.unwrap_err();

    assert_matches!(
        err,
        WorkflowError::Connect {
            source: ScyllaClientError::Connect(_),
            ..
        }
    );
}

#[tokio::test]
#[ntest::timeout(30000)]
async fn seeds_only_discovery_rejects_an_unresolvable_seed() {
    setup_tracing();
    let config = ClientConfig::builder()
        .host("nonexistent.invalid")
        .discovery(DiscoveryMode::SeedsOnly)
        .connection_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let result = ScyllaConnector.connect(&config).await;

    assert_matches!(result, Err(ScyllaClientError::HostFilter(_)));
}
