mod connect;
mod mongo;

use async_trait::async_trait;
use bson::Document;

use crate::clusterup::Result;

pub use connect::{connect_all, connect_with_retry};
pub use mongo::{MongoConnector, MongoNode};

/// Credential to authenticate a connection with
#[derive(Clone, Debug, PartialEq)]
pub struct Credential {
    pub user: String,
    pub password: String,
    /// source is the database the user was created in
    pub source: String,
}

impl Credential {
    pub fn new(user: &str, password: &str, source: &str) -> Self {
        Credential {
            user: user.to_string(),
            password: password.to_string(),
            source: source.to_string(),
        }
    }
}

/// AdminNode is an open connection to the admin database of one server.
#[async_trait]
pub trait AdminNode: Send + Sync {
    fn address(&self) -> &str;

    /// run_command runs an administrative command and returns the reply.
    /// A reply with ok: 0 is returned as an ErrorKind::CommandError.
    async fn run_command(&self, command: Document) -> Result<Document>;
}

/// Connector opens AdminNodes. A connection is only considered open once the server
/// has answered a ping, so an unreachable server is an error here and not on first use.
#[async_trait]
pub trait Connector: Send + Sync {
    type Node: AdminNode;

    async fn connect(&self, address: &str, credential: Option<&Credential>) -> Result<Self::Node>;
}
