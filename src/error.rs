use std::path::PathBuf;
use thiserror::Error;

use crate::process::ProcessId;
use crate::state::window::WindowId;

/// Errors raised by the window manager and its animations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DesktopError {
    /// Another mounted window already owns this taskbar key.
    #[error("Taskbar entry '{0}' already exists")]
    DuplicateTaskbarKey(String),

    #[error("Window {0} not found")]
    WindowNotFound(WindowId),

    /// A transition is already running on the window; the request was dropped.
    #[error("Window {0} is busy animating")]
    AnimationBusy(WindowId),

    #[error("Animation task for window {0} did not complete")]
    AnimationAborted(WindowId),
}

/// Errors raised by the process manager.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Reached process limit of {limit}")]
    CapacityExceeded { limit: usize },

    #[error("Process {0} is already registered")]
    DuplicateProcessId(ProcessId),

    #[error("No process with id {0}")]
    ProcessNotFound(ProcessId),

    #[error("Process {0} was never started")]
    NotStarted(ProcessId),

    #[error("Process {0} is already started")]
    AlreadyStarted(ProcessId),

    #[error("Entry point {} does not exist", .0.display())]
    EntryPointNotFound(PathBuf),

    /// Terminal I/O was requested on a builtin app.
    #[error("Process {0} is not an external program")]
    NotAProgram(ProcessId),

    #[error("PTY error: {0}")]
    Pty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level failure of the shell binary.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Desktop(#[from] DesktopError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}
