use std::borrow::Cow;
use std::env;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use tracing::{debug, info, info_span, warn};

use crate::clusterup::config::config::Settings;
use crate::clusterup::{Error, Result};

/// Load configuration settings from config_name (clusterup.yaml)
/// Searching in order:
/// 1) config_path passed as first command line argument
/// 2) Current directory
/// 3) Any parent directory of the current directory, up to root
/// 4) ~/.config/clusterup/
/// 5) ~/
/// 6) /etc/clusterup/
///
/// If no file is found, the default fixture settings are used.
///
/// This replaces ${ENV_VAR[:DEFAULT]} parameters in the yaml file with values from the environment
/// variable, if set, otherwise, optionally with the given default value after the :
pub fn load_config(config_name: &str) -> Result<&'static Settings> {
    let _span = info_span!("loading config file").entered();
    let settings = match find_config_file(config_name, env::args().nth(1))? {
        Some(config_path) => {
            info!(config_path = %config_path.to_string_lossy(), "found config file");
            let raw_yaml = std::fs::read_to_string(&config_path)?;
            let yaml_text = replace_env_vars(&raw_yaml)?;
            let mut settings = Settings::from_yaml(&yaml_text)?;
            settings.config_path = config_path;
            settings
        },
        None => {
            warn!("config file {} not found, using defaults", config_name);
            Settings::from_yaml("")?
        },
    };
    Ok(Box::leak(Box::new(settings)))
}

/// find_config_file returns the path of the config file to use, if any.
/// An explicit path (from the command line) must exist.
pub(crate) fn find_config_file(config_name: &str, explicit: Option<String>) -> Result<Option<PathBuf>> {
    // Use the full path given as the first command line argument
    if let Some(path) = explicit {
        debug!("using config_path passed on command line");
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(Error::new(format!("config file {} not found", path.to_string_lossy())));
        }
        return Ok(Some(path));
    }

    // Check the current directory or any of its parents for config_name
    if let Ok(start) = env::current_dir() {
        let mut dir = start.as_path();
        while !dir.as_os_str().is_empty() {
            debug!("checking for config file in {}", dir.to_string_lossy());
            let fp = Path::join(dir, config_name);
            if fp.exists() {
                return Ok(Some(fp));
            }
            if let Some(parent) = dir.parent() {
                dir = parent;
            } else {
                break;
            }
        }
    }

    // Check  ~/.config/clusterup/{config_name}
    let mut conf_path = Path::join(Path::new(".config/clusterup"), config_name);
    // HOME is required to be set on POSIX systems, but if it's not set we'll try ~/
    let home = env::var("HOME").unwrap_or_else(|_| "~/".to_string());
    conf_path = Path::join(Path::new(&home), conf_path);
    debug!("checking for config file in {}", conf_path.to_string_lossy());
    if conf_path.exists() {
        return Ok(Some(conf_path));
    }

    // Check ~/.{config_name}
    conf_path = Path::join(Path::new(&home), ".".to_string() + config_name);
    debug!("checking for config file in {}", conf_path.to_string_lossy());
    if conf_path.exists() {
        return Ok(Some(conf_path));
    }

    // Check /etc/clusterup/{config_name}
    conf_path = Path::join(Path::new("/etc/clusterup"), config_name);
    debug!("checking for config file in {}", conf_path.to_string_lossy());
    if conf_path.exists() {
        return Ok(Some(conf_path));
    }

    Ok(None)
}

pub(crate) fn replace_env_vars(raw_yaml: &str) -> Result<Cow<str>> {
    // We only call this function once and then never again, so don't keep the regex
    let re_var = Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)(?::([^}]+?))?\}").map_err(Error::new)?;

    let mut errors = Vec::<String>::new();

    let replaced_text = re_var.replace_all(raw_yaml, |caps: &Captures| {
        match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = caps.get(2) {
                    let s = default.as_str();
                    let val = if let Some(msg) = s.strip_prefix('?') {
                        errors.push(msg.to_string());
                        ""
                    } else {
                        s
                    };
                    val.to_string()
                } else {
                    errors.push(format!("environment variable {} is required but not defined", &caps[1]));
                    "".to_string()
                }
            }
        }
    });

    if errors.is_empty() {
        Ok(replaced_text)
    } else {
        Err(Error::new(errors.join("\n")))
    }
}
