use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::clusterup::common::{Error, Result};
use crate::clusterup::config::topology::{
    check_address, default_replica_sets, default_shards, AuthSettings, ReplicaSet, ShardRouter,
};

/// Settings describes the cluster to bring up and how patient to be about it.
/// Every field has a default matching the standard test fixture, so an empty file is a valid config.
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    /// config_path is the path of the loaded config file, empty if running on defaults
    #[serde(skip_deserializing)]
    pub config_path: PathBuf,
    /// app_name identifies our connections in the server logs
    pub app_name: String,
    /// connect_attempts is how many times we try to open a set of connections before giving up. Default 60.
    pub connect_attempts: u32,
    /// connect_interval_ms is the sleep between connection attempts. Default 1000.
    pub connect_interval_ms: u64,
    /// connect_timeout_ms bounds a single connection attempt (server selection and socket connect). Default 1000.
    pub connect_timeout_ms: u64,
    /// health_polls is how many times we poll replica set status before giving up. Default 60.
    pub health_polls: u32,
    /// health_interval_ms is the sleep between status polls. Default 1000.
    pub health_interval_ms: u64,
    /// settle_ms is how long to wait after all members are healthy before adding shards. Default 2000.
    pub settle_ms: u64,
    pub auth: AuthSettings,
    /// endpoints must all accept connections before any replica set is initiated
    pub endpoints: Vec<String>,
    /// replica_sets are initiated in order
    pub replica_sets: Vec<ReplicaSet>,
    /// shards are added in order once every replica set member is healthy
    pub shards: Vec<ShardRouter>,
}

fn default_endpoints() -> Vec<String> {
    ["127.0.0.1:40001", "127.0.0.1:40002", "127.0.0.1:40011", "127.0.0.1:40021"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            config_path: PathBuf::new(),
            app_name: "clusterup".to_string(),
            connect_attempts: 60,
            connect_interval_ms: 1000,
            connect_timeout_ms: 1000,
            health_polls: 60,
            health_interval_ms: 1000,
            settle_ms: 2000,
            auth: AuthSettings::default(),
            endpoints: default_endpoints(),
            replica_sets: default_replica_sets(),
            shards: default_shards(),
        }
    }
}

impl Settings {
    /// from_yaml parses and validates settings from yaml text (after env var substitution)
    pub fn from_yaml(yaml_text: &str) -> Result<Self> {
        // An empty document means "all defaults". serde_yaml fails with EOF when there is no
        // document at all (blank or comment-only text), and yields unit for a bare "---".
        let has_document = yaml_text.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        let mut settings = if has_document {
            serde_yaml::from_str::<Option<Settings>>(yaml_text)?.unwrap_or_default()
        } else {
            Settings::default()
        };
        settings.load(PathBuf::new())?;
        Ok(settings)
    }

    pub(crate) fn load(&mut self, path: PathBuf) -> Result<()> {
        self.config_path = path;
        if self.connect_attempts == 0 {
            return Err(Error::new("connect_attempts cannot be 0"));
        }
        if self.health_polls == 0 {
            return Err(Error::new("health_polls cannot be 0"));
        }
        if self.auth.users.is_empty() {
            return Err(Error::new("auth.users cannot be empty"));
        }
        for user in &self.auth.users {
            if user.user.is_empty() {
                return Err(Error::new("auth user name cannot be empty"));
            }
        }
        check_address(&self.auth.host)?;
        for endpoint in &self.endpoints {
            check_address(endpoint)?;
        }
        for rs in &self.replica_sets {
            rs.load()?;
        }
        for shard in &self.shards {
            check_address(&shard.router)?;
            if shard.add.iter().any(|s| s.is_empty()) {
                return Err(Error::new(format!("empty shard name for router {}", shard.router)));
            }
        }
        Ok(())
    }

    /// total_members is the healthy member count we wait for across all replica sets
    pub fn total_members(&self) -> usize {
        self.replica_sets.iter().map(|rs| rs.members.len()).sum()
    }

    pub fn connect_interval(&self) -> Duration {
        Duration::from_millis(self.connect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
