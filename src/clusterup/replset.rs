use std::time::Duration;

use bson::{doc, Bson, Document};
use strum::Display;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::clusterup::admin::AdminNode;
use crate::clusterup::config::ReplicaSet;
use crate::clusterup::{ErrorKind, Result};

/// Server error code for replSetInitiate on a set that already has a config
pub const ALREADY_INITIALIZED: i32 = 23;

/// MemberState is the numeric state reported for each member by replSetGetStatus
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MemberState {
    Startup,
    Primary,
    Secondary,
    Recovering,
    Startup2,
    Unknown,
    Arbiter,
    Down,
    Rollback,
    Removed,
}

impl From<i64> for MemberState {
    fn from(state: i64) -> Self {
        match state {
            0 => MemberState::Startup,
            1 => MemberState::Primary,
            2 => MemberState::Secondary,
            3 => MemberState::Recovering,
            5 => MemberState::Startup2,
            7 => MemberState::Arbiter,
            8 => MemberState::Down,
            9 => MemberState::Rollback,
            10 => MemberState::Removed,
            _ => MemberState::Unknown,
        }
    }
}

impl MemberState {
    /// is_serving is true for states that count towards a healthy set
    pub fn is_serving(&self) -> bool {
        matches!(self, MemberState::Primary | MemberState::Secondary)
    }
}

/// initiate runs replSetInitiate for rs on node (which should be the seed of rs).
/// Only a connection failure is an error. A rejected config is logged and left for the
/// health check to report, and a set that is already initiated is fine.
pub async fn initiate<N: AdminNode>(node: &N, rs: &ReplicaSet) -> Result<()> {
    match node.run_command(rs.initiate_command()).await {
        Ok(_) => info!(replica_set = %rs.id, seed = node.address(), members = rs.members.len(), "initiated replica set"),
        Err(e) if e.is_command_code(ALREADY_INITIALIZED) => {
            info!(replica_set = %rs.id, "replica set already initialized")
        },
        Err(e) if matches!(e.kind(), ErrorKind::CommandError(_)) => {
            warn!(replica_set = %rs.id, error = %e, "replSetInitiate failed")
        },
        Err(e) => return Err(e),
    }
    Ok(())
}

/// count_healthy returns the number of members of node's replica set that are up and
/// either primary or secondary. A failed status command counts as zero, which is normal
/// while the set is still electing.
pub async fn count_healthy<N: AdminNode>(node: &N) -> usize {
    match node.run_command(doc! { "replSetGetStatus": 1 }).await {
        Ok(status) => healthy_members(&status),
        Err(e) => {
            debug!(address = node.address(), error = %e, "replSetGetStatus failed");
            0
        },
    }
}

/// healthy_members counts the healthy members in a replSetGetStatus reply
pub fn healthy_members(status: &Document) -> usize {
    let members = match status.get_array("members") {
        Ok(members) => members,
        Err(_) => return 0,
    };
    members.iter()
        .filter_map(Bson::as_document)
        .filter(|m| {
            let health = m.get("health").and_then(as_f64);
            let state = m.get("state").and_then(as_f64).map(|s| MemberState::from(s as i64));
            health == Some(1.0) && state.map_or(false, |s| s.is_serving())
        })
        .count()
}

fn as_f64(value: &Bson) -> Option<f64> {
    match *value {
        Bson::Double(v) => Some(v),
        Bson::Int32(v) => Some(v as f64),
        Bson::Int64(v) => Some(v as f64),
        _ => None,
    }
}

/// wait_healthy polls the seed nodes until the total healthy count equals expected,
/// up to polls times, sleeping interval between polls. Returns true once they match.
pub async fn wait_healthy<N: AdminNode>(seeds: &[&N], expected: usize, polls: u32, interval: Duration) -> bool {
    for poll in 1..=polls {
        let mut count = 0;
        for node in seeds {
            count += count_healthy(*node).await;
        }
        info!(poll, "Replica sets have {} healthy nodes.", count);
        if count == expected {
            return true;
        }
        if poll != polls {
            sleep(interval).await;
        }
    }
    false
}
