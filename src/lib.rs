// Builtin applications
pub mod apps;

// Boot configuration
pub mod config;

pub mod error;

// Input types, geometry and event routing
#[path = "inputHandler/mod.rs"]
pub mod input_handler;

// Process registry and execution units
pub mod process;

// Window manager state
pub mod state;

// Terminal front end
pub mod terminal;

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::ShellConfig;
use error::ShellError;
use process::ProcessManager;
use state::Desktop;
use terminal::TerminalScreen;

/// Send logs to the configured file; stdout belongs to the TUI
fn init_logging(config: &ShellConfig) -> Result<(), ShellError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|e| ShellError::Logging(format!("{}: {}", config.log_file.display(), e)))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| ShellError::Logging(e.to_string()))
}

pub fn run() -> Result<(), ShellError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(ShellError::Runtime)?;

    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let config = runtime.block_on(ShellConfig::discover(explicit, "."))?;
    init_logging(&config)?;
    info!(user = %config.user, "Starting termdesk");

    let desktop = Desktop::new(
        config.desktop.clone(),
        Arc::new(TerminalScreen),
        runtime.handle().clone(),
    );
    let processes = ProcessManager::new(desktop.clone(), config.processes.clone());

    let welcome = apps::launch_welcome(&processes, "Welcome", &config.user)?;
    let result = terminal::run(&desktop, &processes, &config.user, vec![welcome]);

    processes.kill_all();
    info!("Shell stopped");
    result
}
