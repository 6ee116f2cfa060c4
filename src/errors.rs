use crate::services::{classifier::ClassifyError, store::StoreError};
use std::{io, path::PathBuf, process::ExitCode};
use thiserror::Error;

/// Errors that end a run before or between assets.
///
/// Per-asset failures never reach this type; they are recorded as
/// outcomes and the run carries on.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config file could not be found; create one of: {}", crate::config::CONFIG_FILE_NAMES.join(", "))]
    ConfigNotFound,

    #[error("invalid config: {0:#}")]
    ConfigInvalid(anyhow::Error),

    #[error("build directory `{}` does not exist", .0.display())]
    BuildDirMissing(PathBuf),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("could not open local store: {0}")]
    LocalStore(#[from] StoreError),

    #[error("confirmation prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("writing output failed: {0}")]
    Output(#[from] io::Error),
}

impl AppError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::ConfigNotFound => 10,
            AppError::ConfigInvalid(_) => 11,
            AppError::BuildDirMissing(_) => 1,
            AppError::Classify(_)
            | AppError::LocalStore(_)
            | AppError::Prompt(_)
            | AppError::Output(_) => 2,
        }
    }
}

impl From<AppError> for ExitCode {
    fn from(err: AppError) -> Self {
        ExitCode::from(err.exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_and_missing_build_dir_exit_differently() {
        let config = AppError::ConfigNotFound.exit_code();
        let build = AppError::BuildDirMissing(PathBuf::from("/nope")).exit_code();
        assert_ne!(config, 0);
        assert_ne!(build, 0);
        assert_ne!(config, build);
    }

    #[test]
    fn invalid_config_shows_the_cause_chain() {
        let err = AppError::ConfigInvalid(
            anyhow::anyhow!("`bucket.name` must not be empty").context("validating config file"),
        );
        let text = err.to_string();
        assert!(text.contains("validating config file"));
        assert!(text.contains("bucket.name"));
    }
}
