//! Configuration discovery for the command line tool.

use std::path::{Path, PathBuf};

use mailtrail_core::Config;
use tracing::debug;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "MAILTRAIL_CONFIG";

fn default_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./mailtrail.config.ron"),
        PathBuf::from("/etc/mailtrail/mailtrail.config.ron"),
    ]
}

/// Find the configuration file using the following precedence:
/// 1. `MAILTRAIL_CONFIG` environment variable
/// 2. ./mailtrail.config.ron (current working directory)
/// 3. /etc/mailtrail/mailtrail.config.ron (system-wide config)
///
/// Unlike the environment variable, the default locations are optional:
/// `Ok(None)` means the built-in defaults apply.
///
/// # Errors
///
/// Fails if `MAILTRAIL_CONFIG` points to a file that does not exist.
pub fn find_config_file() -> anyhow::Result<Option<PathBuf>> {
    find_in(std::env::var(CONFIG_ENV).ok(), &default_paths())
}

fn find_in(env_path: Option<String>, defaults: &[PathBuf]) -> anyhow::Result<Option<PathBuf>> {
    if let Some(env_path) = env_path {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(Some(path));
        }
        anyhow::bail!(
            "{CONFIG_ENV} points to non-existent file: {}",
            path.display()
        );
    }

    Ok(defaults.iter().find(|path| path.exists()).cloned())
}

/// Read a RON configuration file.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a valid configuration,
/// including an unsupported `mta_log_type`.
pub fn load_from(path: &Path) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        anyhow::anyhow!("Failed to read config from {}: {e}", path.display())
    })?;

    ron::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid config in {}: {e}", path.display()))
}

/// Load the configuration, preferring an explicitly given path.
///
/// # Errors
///
/// See [`find_config_file`] and [`load_from`].
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            load_from(&path)
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}
