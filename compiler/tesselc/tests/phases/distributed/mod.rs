//! Multi-locality behavior through `LocalityCluster`.
//!
//! - `annotations` - tile reconciliation across localities
//! - `collectives` - timeouts, aborts and mismatched contributions
//! - `remote` - resolving and invoking nodes owned by another locality

mod annotations;
mod collectives;
mod remote;

use std::time::Duration;

use tesselc::{LocalityCluster, SessionConfig};

pub fn cluster(count: u32) -> LocalityCluster {
    cluster_with_timeout(count, Duration::from_secs(5))
}

pub fn cluster_with_timeout(count: u32, timeout: Duration) -> LocalityCluster {
    let config = SessionConfig {
        collective_timeout: timeout,
        ..SessionConfig::default()
    };
    LocalityCluster::new(count, &config).unwrap()
}
