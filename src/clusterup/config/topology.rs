use std::collections::HashSet;

use bson::{doc, Document};
use serde::Deserialize;

use crate::clusterup::common::{Error, Result};

#[derive(Deserialize, Clone, Debug)]
pub struct AuthSettings {
    /// host is the node where users are created, defaults to 127.0.0.1:40002
    #[serde(default = "default_auth_host")]
    pub host: String,
    /// database the users are created in and authenticate against, defaults to admin
    #[serde(default = "default_auth_database")]
    pub database: String,
    /// users are created in order. The first user must be able to create the others,
    /// since we authenticate as that user before creating the rest.
    #[serde(default = "default_users")]
    pub users: Vec<User>,
}

fn default_auth_host() -> String { "127.0.0.1:40002".to_string() }
fn default_auth_database() -> String { "admin".to_string() }

fn default_users() -> Vec<User> {
    vec![
        User::new("root", "rapadura", false),
        User::new("reader", "rapadura", true),
    ]
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            host: default_auth_host(),
            database: default_auth_database(),
            users: default_users(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct User {
    pub user: String,
    pub password: String,
    /// roles granted on the auth database. Defaults to root.
    #[serde(default)]
    pub roles: Vec<String>,
    /// read_only grants readAnyDatabase instead of roles
    #[serde(default)]
    pub read_only: bool,
}

impl User {
    pub fn new(user: &str, password: &str, read_only: bool) -> Self {
        User {
            user: user.to_string(),
            password: password.to_string(),
            roles: vec![],
            read_only,
        }
    }

    pub fn granted_roles(&self) -> Vec<String> {
        if self.read_only {
            vec!["readAnyDatabase".to_string()]
        } else if self.roles.is_empty() {
            vec!["root".to_string()]
        } else {
            self.roles.clone()
        }
    }

    /// create_command builds the createUser command for this user in database
    pub fn create_command(&self, database: &str) -> Document {
        let roles: Vec<Document> = self.granted_roles()
            .into_iter()
            .map(|role| doc! { "role": role, "db": database })
            .collect();
        doc! {
            "createUser": self.user.as_str(),
            "pwd": self.password.as_str(),
            "roles": roles,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Member {
    pub id: i32,
    pub host: String,
    #[serde(default = "default_priority")]
    pub priority: f64,
}

const fn default_priority() -> f64 { 1.0 }

impl Member {
    pub fn new(id: i32, host: &str, priority: f64) -> Self {
        Member { id, host: host.to_string(), priority }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ReplicaSet {
    pub id: String,
    /// members in the order they are passed to replSetInitiate. The first member is the seed
    /// we initiate the set on and poll for status.
    pub members: Vec<Member>,
    /// settings document passed through to the replica set config
    #[serde(default)]
    pub settings: Document,
}

impl ReplicaSet {
    pub fn new(id: &str, members: Vec<Member>) -> Self {
        ReplicaSet {
            id: id.to_string(),
            members,
            settings: Document::new(),
        }
    }

    /// seed returns the address of the first member, None if the set has no members
    pub fn seed(&self) -> Option<&str> {
        self.members.first().map(|m| m.host.as_str())
    }

    pub fn initiate_command(&self) -> Document {
        let members: Vec<Document> = self.members
            .iter()
            .map(|m| doc! { "_id": m.id, "host": m.host.as_str(), "priority": m.priority })
            .collect();
        doc! {
            "replSetInitiate": {
                "_id": self.id.as_str(),
                "members": members,
                "settings": self.settings.clone(),
            }
        }
    }

    pub(crate) fn load(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::new("replica set id cannot be empty"));
        }
        if self.members.is_empty() {
            return Err(Error::new(format!("replica set {} has no members", self.id)));
        }
        let mut ids = HashSet::new();
        for member in &self.members {
            if !ids.insert(member.id) {
                return Err(Error::new(format!("replica set {} has duplicate member id {}", self.id, member.id)));
            }
            check_address(&member.host)?;
        }
        Ok(())
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ShardRouter {
    /// router is the address of the mongos (or config server) that accepts addShard
    pub router: String,
    /// add is the list of shard connection strings, either host:port or set/host:port
    pub add: Vec<String>,
}

impl ShardRouter {
    pub fn new(router: &str, add: &[&str]) -> Self {
        ShardRouter {
            router: router.to_string(),
            add: add.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub(crate) fn default_replica_sets() -> Vec<ReplicaSet> {
    vec![
        ReplicaSet::new("rs2", vec![
            Member::new(1, "127.0.0.1:40021", 1.0),
            Member::new(2, "127.0.0.1:40022", 1.0),
            Member::new(3, "127.0.0.1:40023", 1.0),
        ]),
        // We know the master of rs1 (priority 1), but not of rs2.
        ReplicaSet::new("rs1", vec![
            Member::new(1, "127.0.0.1:40011", 1.0),
            Member::new(2, "127.0.0.1:40012", 0.0),
            Member::new(3, "127.0.0.1:40013", 0.0),
        ]),
    ]
}

pub(crate) fn default_shards() -> Vec<ShardRouter> {
    vec![
        ShardRouter::new("127.0.0.1:40201", &["127.0.0.1:40001", "rs1/127.0.0.1:40011"]),
        ShardRouter::new("127.0.0.1:40202", &["rs2/127.0.0.1:40021"]),
    ]
}

/// check_address verifies addr looks like host:port
pub fn check_address(addr: &str) -> Result<()> {
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(Error::new(format!("invalid address {:?}, expected host:port", addr))),
    }
}
