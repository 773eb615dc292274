mod config;
mod topology;
mod load;

pub use config::*;
pub use topology::*;
pub use load::load_config;
#[cfg(test)]
pub(crate) use load::{find_config_file, replace_env_vars};
