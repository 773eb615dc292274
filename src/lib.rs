pub mod clusterup;
#[cfg(test)]
mod tests;

pub use crate::clusterup::*;

use std::io;

use tokio::runtime::{Builder, Runtime};
use tracing_subscriber::FmtSubscriber;
use tracing::Level;

use crate::clusterup::admin::MongoConnector;
use crate::clusterup::bootstrap::{bootstrap, Outcome};
use crate::clusterup::config::{load_config, Settings};
use crate::clusterup::common::Result;


pub fn init_tracing(max_level: Level) {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than max_level will be written to stdout.
        .with_max_level(max_level)
        // completes the builder.
        .finish();

    // A test harness may have installed one already, that's fine
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Load the configuration settings from clusterup.yaml
/// See clusterup::config::load_config for more info.
pub fn init_settings() -> Result<&'static Settings> {
    load_config("clusterup.yaml")
}

pub fn init_runtime() -> io::Result<Runtime> {
    // Everything we do is sequential, one thread is plenty
    Builder::new_current_thread()
        .enable_all()
        .build()
}

/// run brings the cluster up with the mongodb driver, blocking until it's done.
pub fn run(conf: &'static Settings, tokio: &Runtime) -> Result<Outcome> {
    tokio.block_on(async move {
        let connector = MongoConnector::from_settings(conf);
        bootstrap(conf, &connector).await
    })
}
