//! Launching retraining in an isolated process

use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

/// Runs the training pipeline to completion
///
/// Implementations block until training finishes and return an error when it
/// did not complete successfully.
pub trait TrainingLauncher {
    fn launch(&self) -> Result<()>;
}

/// Runs retraining as a child process and waits for it
#[derive(Debug, Clone)]
pub struct ProcessTrainingLauncher {
    program: PathBuf,
    args: Vec<String>,
    config_path: Option<PathBuf>,
}

impl ProcessTrainingLauncher {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            config_path: None,
        }
    }

    /// Build from a configured command line; empty means `<current exe> retrain`
    pub fn from_command(command: &[String]) -> Result<Self> {
        match command.split_first() {
            Some((program, args)) => Ok(Self::new(program, args.to_vec())),
            None => {
                let exe = std::env::current_exe().map_err(|e| {
                    AppError::Configuration(format!("Cannot locate current executable: {}", e))
                })?;
                Ok(Self::new(exe, vec!["retrain".to_string()]))
            }
        }
    }

    /// Forward a configuration file to the child through `CONFIG_PATH`
    pub fn with_config_path(mut self, path: Option<&Path>) -> Self {
        self.config_path = path.map(Path::to_path_buf);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl TrainingLauncher for ProcessTrainingLauncher {
    fn launch(&self) -> Result<()> {
        info!(program = %self.program.display(), args = ?self.args, "Triggering automatic retraining");

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(path) = &self.config_path {
            command.env("CONFIG_PATH", path);
        }

        let status = command.status().map_err(|e| {
            AppError::RetrainingFailed(format!(
                "could not start {}: {}",
                self.program.display(),
                e
            ))
        })?;

        if !status.success() {
            return Err(AppError::RetrainingFailed(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }

        info!("Retraining process completed successfully");
        Ok(())
    }
}
