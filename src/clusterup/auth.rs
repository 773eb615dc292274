use tracing::{info, info_span, warn, Instrument};

use crate::clusterup::admin::{connect_with_retry, AdminNode, Connector, Credential};
use crate::clusterup::config::{Settings, User};
use crate::clusterup::{Error, Result};

/// Server error code for createUser on a name that's taken
pub const USER_ALREADY_EXISTS: i32 = 51003;
/// Server error code for a command that requires authentication
pub const UNAUTHORIZED: i32 = 13;

/// provision_users creates conf.auth.users on conf.auth.host.
///
/// The first user is created over an unauthenticated connection (the localhost exception),
/// then we reconnect as that user to create the rest, since the exception closes as soon
/// as the first user exists.
pub async fn provision_users<C: Connector>(conf: &Settings, connector: &C) -> Result<()> {
    let auth = &conf.auth;
    async move {
        let first = auth.users.first().ok_or_else(|| Error::new("no users to create"))?;

        let mut nodes = connect_with_retry(
            connector,
            std::slice::from_ref(&auth.host),
            None,
            conf.connect_attempts,
            conf.connect_interval(),
        ).await?;
        let node = nodes.remove(0);
        // On a rerun the localhost exception is already closed, the authenticated
        // connection below tells us whether the first user is really there.
        create_user(&node, first, &auth.database, &[USER_ALREADY_EXISTS, UNAUTHORIZED]).await?;
        drop(node);

        let credential = Credential::new(&first.user, &first.password, &auth.database);
        let node = connector.connect(&auth.host, Some(&credential)).await?;
        for user in &auth.users[1..] {
            create_user(&node, user, &auth.database, &[USER_ALREADY_EXISTS]).await?;
        }
        Ok::<(), Error>(())
    }.instrument(info_span!("auth", host = %auth.host)).await
}

async fn create_user<N: AdminNode>(node: &N, user: &User, database: &str, tolerated: &[i32]) -> Result<()> {
    match node.run_command(user.create_command(database)).await {
        Ok(_) => {
            info!(user = %user.user, roles = ?user.granted_roles(), "created user");
            Ok(())
        },
        Err(e) if tolerated.iter().any(|&code| e.is_command_code(code)) => {
            warn!(user = %user.user, error = %e, "could not create user, assuming it exists");
            Ok(())
        },
        Err(e) => Err(e),
    }
}
