use bson::doc;
use tracing::{info, info_span, warn, Instrument};

use crate::clusterup::admin::{AdminNode, Connector};
use crate::clusterup::config::ShardRouter;
use crate::clusterup::Result;

/// add_shards connects to each router once and issues addShard for each of its shards in order.
/// A router we can't reach is an error. A rejected addShard is logged and skipped.
pub async fn add_shards<C: Connector>(connector: &C, routers: &[ShardRouter]) -> Result<()> {
    for router in routers {
        async {
            let node = connector.connect(&router.router, None).await?;
            for shard in &router.add {
                match node.run_command(doc! { "addShard": shard.as_str() }).await {
                    Ok(reply) => info!(shard = %shard, added = ?reply.get_str("shardAdded").ok(), "added shard"),
                    Err(e) => warn!(shard = %shard, error = %e, "addShard failed"),
                }
            }
            Ok::<(), crate::clusterup::Error>(())
        }.instrument(info_span!("router", address = %router.router)).await?;
    }
    Ok(())
}
