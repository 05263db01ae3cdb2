//! CLI-specific error types and exit code mapping

use crudcheck_core::error::{CrudcheckError, DataError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// One or more scenarios failed.
    #[error("{failed} of {total} scenarios failed")]
    ScenariosFailed { failed: usize, total: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from crudcheck-core.
    #[error("{0}")]
    Core(CrudcheckError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                               |
    /// |------|---------------------------------------|
    /// | 0    | Success                               |
    /// | 1    | Scenario failure / command error      |
    /// | 2    | Configuration error                   |
    /// | 10   | IO error                              |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
            Self::ScenariosFailed { .. }
            | Self::Command(_)
            | Self::JsonSerialize(_)
            | Self::Core(_) => 1,
        }
    }
}

impl From<CrudcheckError> for CliError {
    fn from(err: CrudcheckError) -> Self {
        match err {
            CrudcheckError::Config(e) => Self::Config(e.to_string()),
            CrudcheckError::Data(e) => Self::Config(format!("[data] {e}")),
            CrudcheckError::Io(e) => Self::Io(e),
            other => Self::Core(other),
        }
    }
}

impl From<DataError> for CliError {
    fn from(e: DataError) -> Self {
        CrudcheckError::from(e).into()
    }
}

impl From<crudcheck_appliance::ApplianceError> for CliError {
    fn from(e: crudcheck_appliance::ApplianceError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<crudcheck_intelligence::IntelligenceError> for CliError {
    fn from(e: crudcheck_intelligence::IntelligenceError) -> Self {
        CrudcheckError::from(e).into()
    }
}

impl From<crudcheck_cloud::CloudError> for CliError {
    fn from(e: crudcheck_cloud::CloudError) -> Self {
        match e {
            crudcheck_cloud::CloudError::UnknownProvider(name) => {
                Self::Command(format!("unknown provider: {name}"))
            }
            other => CrudcheckError::from(other).into(),
        }
    }
}
