/// `load_config` module: locates and reads `gislack.cfg` for a command.
///
/// # Responsibilities
/// - Resolve the configuration directory (`--cfgdirectory`, then `GISLACK_CFG_PATH`, then the
///   working directory)
/// - Read the file through [`GislackConfig::load`], logging where it came from
/// - Turn a missing file into a clear instruction to run `gislack auth`
/// - Check that the token a command needs is present before any request is made
///
/// # Errors
/// Everything here returns `anyhow::Error`; the message is what the user sees.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use gislack_core::config::{GislackConfig, CONFIG_DIR_ENV, CONFIG_FILE_NAME};
use tracing::{error, info};

use crate::options::{config_dir, Location};

/// Where a command reads and writes its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub workdir: PathBuf,
    pub file: PathBuf,
}

pub fn locate<A: Location>(args: &A) -> Result<ConfigLocation> {
    let workdir = args
        .resolve_workdir()
        .context("cannot determine the working directory")?;
    let dir = config_dir(
        args.cfgdirectory(),
        std::env::var(CONFIG_DIR_ENV).ok(),
        &workdir,
    );
    let file = dir.join(CONFIG_FILE_NAME);
    info!(config_path = %file.display(), workdir = %workdir.display(), "Resolved config location");
    Ok(ConfigLocation { workdir, file })
}

/// Loads the file, or `None` when it does not exist yet.
pub fn load_optional(path: &Path) -> Result<Option<GislackConfig>> {
    GislackConfig::load(path).map_err(|e| {
        error!(error = %e, config_path = %path.display(), "Failed to load config");
        anyhow!(e)
    })
}

/// Loads the file; a missing file is an error.
pub fn load_config(path: &Path) -> Result<GislackConfig> {
    match load_optional(path)? {
        Some(config) => Ok(config),
        None => {
            error!(config_path = %path.display(), "Config file not found");
            Err(anyhow!(
                "{CONFIG_FILE_NAME} is not found in {}. Please retrieve access tokens for gist and/or slack by running 'gislack auth'.",
                path.parent().unwrap_or(path).display()
            ))
        }
    }
}

pub fn require_gist_token(config: &GislackConfig) -> Result<String> {
    config.gist_token().map(str::to_string).ok_or_else(|| {
        anyhow!("no access token for gist. Run 'gislack auth --gistclientid ID --gistclientsecret SECRET'.")
    })
}

pub fn require_slack_token(config: &GislackConfig) -> Result<String> {
    config.slack_token().map(str::to_string).ok_or_else(|| {
        anyhow!("no access token for slack. Run 'gislack auth --slackclientid ID --slackclientsecret SECRET'.")
    })
}
