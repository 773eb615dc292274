use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tracing::{debug, instrument};

use crate::clusterup::admin::{AdminNode, Connector, Credential};
use crate::clusterup::config::Settings;
use crate::clusterup::Result;

const ADMIN_DATABASE: &str = "admin";

/// MongoConnector opens direct connections with the mongodb driver.
/// Direct connections are required because the replica set members we talk to
/// have not been initiated yet, so there's no topology to discover.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    app_name: String,
    timeout: Duration,
}

impl MongoConnector {
    pub fn new(app_name: &str, timeout: Duration) -> Self {
        MongoConnector {
            app_name: app_name.to_string(),
            timeout,
        }
    }

    pub fn from_settings(conf: &Settings) -> Self {
        Self::new(&conf.app_name, conf.connect_timeout())
    }

    async fn client_options(&self, address: &str, credential: Option<&Credential>) -> Result<ClientOptions> {
        let mut options = ClientOptions::parse(format!("mongodb://{}/", address)).await?;
        options.direct_connection = Some(true);
        options.server_selection_timeout = Some(self.timeout);
        options.connect_timeout = Some(self.timeout);
        options.app_name = Some(self.app_name.clone());
        if let Some(c) = credential {
            let mut cred = mongodb::options::Credential::default();
            cred.username = Some(c.user.clone());
            cred.password = Some(c.password.clone());
            cred.source = Some(c.source.clone());
            options.credential = Some(cred);
        }
        Ok(options)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Node = MongoNode;

    #[instrument(skip(self, credential))]
    async fn connect(&self, address: &str, credential: Option<&Credential>) -> Result<MongoNode> {
        let options = self.client_options(address, credential).await?;
        let client = Client::with_options(options)?;
        let db = client.database(ADMIN_DATABASE);
        // The driver connects lazily, force a round-trip so unreachable servers fail here
        db.run_command(doc! { "ping": 1 }).await?;
        debug!("connected");
        Ok(MongoNode {
            address: address.to_string(),
            db,
        })
    }
}

pub struct MongoNode {
    address: String,
    db: Database,
}

#[async_trait]
impl AdminNode for MongoNode {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run_command(&self, command: Document) -> Result<Document> {
        Ok(self.db.run_command(command).await?)
    }
}
