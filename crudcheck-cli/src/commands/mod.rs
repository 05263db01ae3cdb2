//! Command handlers -- one module per subcommand

pub mod config;
pub mod list;
pub mod run;

use std::path::Path;

use tracing::info;

use crudcheck_core::config::CrudcheckConfig;

use crate::error::CliError;

/// Load the effective configuration for `run` and `list`.
///
/// A missing file is not an error here: built-in defaults plus environment
/// overrides are used instead. `config validate` still reports it.
pub async fn load_config(path: &Path) -> Result<CrudcheckConfig, CliError> {
    if tokio::fs::try_exists(path).await? {
        return Ok(CrudcheckConfig::load(path).await?);
    }

    info!(path = %path.display(), "config file not found, using defaults");
    let mut config = CrudcheckConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
