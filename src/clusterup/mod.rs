pub mod config;
pub mod common;
pub mod admin;
pub mod auth;
pub mod replset;
pub mod shard;
pub mod bootstrap;

pub use common::{Error, ErrorKind, Result};
