use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bson::{doc, Bson, Document};

use crate::clusterup::admin::{AdminNode, Connector, Credential};
use crate::clusterup::config::Settings;
use crate::clusterup::{Error, Result};

pub const TEST_PASSWORD: &str = "rapadura"; // the kind of thing an idiot might put on their luggage

/// A command as seen by the fake cluster, in the order it arrived
#[derive(Debug, Clone)]
pub struct Logged {
    pub address: String,
    pub user: Option<String>,
    pub name: String,
    pub command: Document,
}

#[derive(Default)]
struct State {
    /// connect attempts per address
    connects: HashMap<String, u32>,
    /// address -> number of connect attempts that fail before it comes up
    unreachable_for: HashMap<String, u32>,
    /// addresses that never come up
    down: HashSet<String>,
    /// status polls per seed before all members report healthy, None for immediately
    healthy_after: Option<u32>,
    never_healthy: bool,
    status_polls: HashMap<String, u32>,
    /// seed address -> member count of the initiated set
    initiated: HashMap<String, usize>,
    users: HashSet<String>,
    log: Vec<Logged>,
}

/// FakeCluster is an in-memory stand-in for the mongod/mongos processes of the test fixture.
/// It answers the handful of admin commands the bootstrap issues and records them.
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unreachable_for(&self, address: &str, attempts: u32) -> &Self {
        self.state.lock().unwrap().unreachable_for.insert(address.to_string(), attempts);
        self
    }

    pub fn down(&self, address: &str) -> &Self {
        self.state.lock().unwrap().down.insert(address.to_string());
        self
    }

    pub fn healthy_after(&self, polls: u32) -> &Self {
        self.state.lock().unwrap().healthy_after = Some(polls);
        self
    }

    pub fn never_healthy(&self) -> &Self {
        self.state.lock().unwrap().never_healthy = true;
        self
    }

    pub fn add_user(&self, user: &str) -> &Self {
        self.state.lock().unwrap().users.insert(user.to_string());
        self
    }

    pub fn connects(&self, address: &str) -> u32 {
        *self.state.lock().unwrap().connects.get(address).unwrap_or(&0)
    }

    pub fn log(&self) -> Vec<Logged> {
        self.state.lock().unwrap().log.clone()
    }

    /// commands returns the logged commands with the given name
    pub fn commands(&self, name: &str) -> Vec<Logged> {
        self.log().into_iter().filter(|l| l.name == name).collect()
    }

    /// position returns the index in the log of the first and last command with the given name
    pub fn position(&self, name: &str) -> Option<(usize, usize)> {
        let log = self.log();
        let first = log.iter().position(|l| l.name == name)?;
        let last = log.iter().rposition(|l| l.name == name)?;
        Some((first, last))
    }
}

#[async_trait]
impl Connector for FakeCluster {
    type Node = FakeNode;

    async fn connect(&self, address: &str, credential: Option<&Credential>) -> Result<FakeNode> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let attempts = state.connects.entry(address.to_string()).or_insert(0);
        *attempts += 1;
        let attempts = *attempts;
        if state.down.contains(address) {
            return Err(Error::new(format!("{}: connection refused", address)));
        }
        if attempts <= *state.unreachable_for.get(address).unwrap_or(&0) {
            return Err(Error::new(format!("{}: connection refused", address)));
        }
        if let Some(c) = credential {
            if !state.users.contains(&c.user) || c.password != TEST_PASSWORD {
                return Err(Error::command(18, "AuthenticationFailed", "Authentication failed."));
            }
        }
        Ok(FakeNode {
            address: address.to_string(),
            user: credential.map(|c| c.user.clone()),
            cluster: self.clone(),
        })
    }
}

pub struct FakeNode {
    address: String,
    user: Option<String>,
    cluster: FakeCluster,
}

#[async_trait]
impl AdminNode for FakeNode {
    fn address(&self) -> &str {
        &self.address
    }

    async fn run_command(&self, command: Document) -> Result<Document> {
        let name = command.keys().next().cloned().unwrap_or_default();
        let mut guard = self.cluster.state.lock().unwrap();
        let state = &mut *guard;
        state.log.push(Logged {
            address: self.address.clone(),
            user: self.user.clone(),
            name: name.clone(),
            command: command.clone(),
        });

        match name.as_str() {
            "createUser" => {
                let user = command.get_str("createUser").unwrap().to_string();
                if !state.users.is_empty() && self.user.is_none() {
                    return Err(Error::command(13, "Unauthorized", "command createUser requires authentication"));
                }
                if !state.users.insert(user) {
                    return Err(Error::command(51003, "Location51003", "User already exists"));
                }
                Ok(doc! { "ok": 1.0 })
            },
            "replSetInitiate" => {
                if state.initiated.contains_key(&self.address) {
                    return Err(Error::command(23, "AlreadyInitialized", "already initialized"));
                }
                let config = command.get_document("replSetInitiate").unwrap();
                let members = config.get_array("members").unwrap().len();
                state.initiated.insert(self.address.clone(), members);
                Ok(doc! { "ok": 1.0 })
            },
            "replSetGetStatus" => {
                let members = match state.initiated.get(&self.address) {
                    Some(&n) => n,
                    None => return Err(Error::command(94, "NotYetInitialized", "no replset config has been received")),
                };
                let polls = state.status_polls.entry(self.address.clone()).or_insert(0);
                *polls += 1;
                let healthy = !state.never_healthy && state.healthy_after.map_or(true, |n| *polls > n);
                // Until the set is healthy only the primary is up
                let members: Vec<Bson> = (0..members)
                    .map(|i| {
                        let member_state = if i == 0 { 1 } else if healthy { 2 } else { 5 };
                        Bson::Document(doc! { "_id": i as i32, "health": 1.0, "state": member_state })
                    })
                    .collect();
                Ok(doc! { "members": members, "ok": 1.0 })
            },
            "addShard" => {
                let shard = command.get_str("addShard").unwrap();
                let name = shard.split('/').next().unwrap_or(shard).to_string();
                Ok(doc! { "shardAdded": name, "ok": 1.0 })
            },
            _ => Ok(doc! { "ok": 1.0 }),
        }
    }
}

/// fast_settings is the default fixture with all the waiting taken out
pub fn fast_settings() -> Settings {
    let mut conf = Settings::default();
    conf.connect_attempts = 5;
    conf.connect_interval_ms = 0;
    conf.health_polls = 5;
    conf.health_interval_ms = 0;
    conf.settle_ms = 0;
    conf
}
