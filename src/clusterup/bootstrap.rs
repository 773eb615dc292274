use strum::Display;
use tokio::time::sleep;
use tracing::{error, info, info_span, Instrument};

use crate::clusterup::admin::{connect_with_retry, Connector};
use crate::clusterup::auth::provision_users;
use crate::clusterup::config::Settings;
use crate::clusterup::replset::{initiate, wait_healthy};
use crate::clusterup::shard::add_shards;
use crate::clusterup::{Error, Result};

/// Outcome of a bootstrap run that didn't hit an error
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    #[strum(serialize = "Cluster is up.")]
    Ready,
    #[strum(serialize = "Replica sets didn't sync up properly.")]
    ReplicaSetsUnhealthy,
}

impl Outcome {
    /// exit_code is the process exit status the test harness expects for this outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Ready => 0,
            Outcome::ReplicaSetsUnhealthy => 12,
        }
    }
}

/// bootstrap brings the cluster described by conf up:
/// 1) create the users on the auth node
/// 2) wait until every endpoint and replica set seed accepts connections
/// 3) initiate each replica set on its seed
/// 4) poll until every configured member is healthy
/// 5) add the shards
///
/// Shards are only added once the healthy count matches conf.total_members().
/// If that doesn't happen within conf.health_polls polls, returns Outcome::ReplicaSetsUnhealthy.
pub async fn bootstrap<C: Connector>(conf: &Settings, connector: &C) -> Result<Outcome> {
    // Settings built in code may not have been through load(), check before touching any server
    let mut seed_addresses = Vec::with_capacity(conf.replica_sets.len());
    for rs in &conf.replica_sets {
        let seed = rs.seed().ok_or_else(|| Error::new(format!("replica set {} has no members", rs.id)))?;
        seed_addresses.push(seed);
    }

    provision_users(conf, connector).await?;

    // The seeds are usually among the endpoints, but make sure we can reach them too
    let mut addresses = conf.endpoints.clone();
    for &seed in &seed_addresses {
        if !addresses.iter().any(|a| a == seed) {
            addresses.push(seed.to_string());
        }
    }
    let nodes = connect_with_retry(connector, &addresses, None, conf.connect_attempts, conf.connect_interval())
        .instrument(info_span!("connect"))
        .await?;

    let mut seeds = Vec::with_capacity(conf.replica_sets.len());
    for (rs, &seed) in conf.replica_sets.iter().zip(&seed_addresses) {
        let i = addresses.iter()
            .position(|a| a == seed)
            .ok_or_else(|| Error::new(format!("no connection to seed {}", seed)))?;
        initiate(&nodes[i], rs).await?;
        seeds.push(&nodes[i]);
    }

    let expected = conf.total_members();
    let healthy = wait_healthy(&seeds, expected, conf.health_polls, conf.health_interval())
        .instrument(info_span!("health", expected))
        .await;
    if !healthy {
        error!(expected, polls = conf.health_polls, "{}", Outcome::ReplicaSetsUnhealthy);
        return Ok(Outcome::ReplicaSetsUnhealthy);
    }

    sleep(conf.settle()).await;
    add_shards(connector, &conf.shards).await?;
    info!(replica_sets = conf.replica_sets.len(), shards = conf.shards.len(), "cluster is up");
    Ok(Outcome::Ready)
}
