//! Reasoning runtime launcher.
//!
//! The runtime is an external process. Before starting it, the launcher
//! sets two operational flags in its environment: one selecting in-memory
//! (non-persistent) execution, one permitting blocking calls inside
//! otherwise non-blocking execution contexts. Neither is part of the
//! triage contract.

use tokio::process::{Child, Command};
use tracing::info;

use crate::error::LauncherError;

/// Selects non-persistent, in-memory execution.
pub const ENV_IN_MEMORY: &str = "RUNTIME_IN_MEMORY";
/// Permits blocking calls inside non-blocking execution contexts.
pub const ENV_ALLOW_BLOCKING: &str = "RUNTIME_ALLOW_BLOCKING";

/// Launcher configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub program: String,
    pub args: Vec<String>,
    pub in_memory: bool,
    pub allow_blocking: bool,
}

impl LauncherConfig {
    /// Build config from the environment.
    /// Returns `None` if `INBOX_ASSIST_RUNTIME_CMD` is not set (launch disabled).
    pub fn from_env() -> Option<Self> {
        let cmdline = std::env::var("INBOX_ASSIST_RUNTIME_CMD").ok()?;
        let mut parts = cmdline.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            in_memory: true,
            allow_blocking: true,
        })
    }
}

/// Spawns the external reasoning runtime.
pub struct RuntimeLauncher {
    config: LauncherConfig,
}

impl RuntimeLauncher {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    /// Start the runtime process with the operational flags set.
    pub fn spawn(&self) -> Result<Child, LauncherError> {
        if self.config.program.is_empty() {
            return Err(LauncherError::MissingProgram);
        }

        let mut command = Command::new(&self.config.program);
        command.args(&self.config.args);
        if self.config.in_memory {
            command.env(ENV_IN_MEMORY, "true");
        }
        if self.config.allow_blocking {
            command.env(ENV_ALLOW_BLOCKING, "true");
        }
        command.kill_on_drop(true);

        let child = command.spawn()?;
        info!(
            program = %self.config.program,
            pid = child.id().unwrap_or_default(),
            "Launched reasoning runtime"
        );
        Ok(child)
    }
}
