use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::clusterup::admin::{Connector, Credential};
use crate::clusterup::{Error, Result};

/// connect_all opens a connection to each address in order, failing on the first that can't be opened.
pub async fn connect_all<C: Connector>(connector: &C, addresses: &[String], credential: Option<&Credential>) -> Result<Vec<C::Node>> {
    let mut nodes = Vec::with_capacity(addresses.len());
    for address in addresses {
        nodes.push(connector.connect(address, credential).await?);
    }
    Ok(nodes)
}

/// connect_with_retry calls connect_all up to attempts times, sleeping interval between attempts.
/// There's no backoff: the servers are local and expected to come up within seconds.
/// Returns ErrorKind::Timeout if every attempt fails.
pub async fn connect_with_retry<C: Connector>(
    connector: &C,
    addresses: &[String],
    credential: Option<&Credential>,
    attempts: u32,
    interval: Duration,
) -> Result<Vec<C::Node>> {
    for attempt in 1..=attempts {
        match connect_all(connector, addresses, credential).await {
            Ok(nodes) => {
                debug!(attempt, "connected to {} servers", nodes.len());
                return Ok(nodes);
            },
            Err(e) => info!(attempt, error = %e, "Can't connect yet..."),
        }
        if attempt != attempts {
            sleep(interval).await;
        }
    }
    Err(Error::timeout())
}
