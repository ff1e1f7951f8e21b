use std::sync::Arc;
use std::thread;
use tokio::task::AbortHandle;
use tracing::{error, info};

use super::pty::ProgramUnit;
use super::{AppContext, Application, ProcessId};
use crate::error::ProcessError;

/// The running half of a process
pub(crate) enum ExecutionUnit {
    /// Builtin app on a thread of its own
    App(AppUnit),
    /// External program attached to a pseudo-terminal
    Program(ProgramUnit),
}

impl ExecutionUnit {
    pub(crate) fn is_running(&mut self) -> bool {
        match self {
            ExecutionUnit::App(app) => app.is_running(),
            ExecutionUnit::Program(program) => program.is_running(),
        }
    }

    /// Stop the unit without waiting for it to wind down
    pub(crate) fn terminate(self) -> Result<(), ProcessError> {
        match self {
            ExecutionUnit::App(app) => {
                app.terminate();
                Ok(())
            }
            ExecutionUnit::Program(program) => program.terminate(),
        }
    }
}

/// A builtin app driven by a private single-threaded runtime on a dedicated
/// OS thread. Blocking inside the app never stalls the desktop's timers.
pub(crate) struct AppUnit {
    abort: AbortHandle,
    thread: thread::JoinHandle<()>,
}

impl AppUnit {
    pub(crate) fn spawn(
        pid: ProcessId,
        name: String,
        app: Arc<dyn Application>,
        ctx: AppContext,
    ) -> Result<Self, ProcessError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        // Queued now, polled once the thread starts driving the runtime
        let task = runtime.spawn(async move {
            match app.main(ctx).await {
                Ok(()) => info!(pid, name = %name, "Process finished"),
                Err(e) => error!(pid, name = %name, error = %e, "Process failed"),
            }
        });
        let abort = task.abort_handle();

        let thread = thread::Builder::new()
            .name(format!("proc-{}", pid))
            .spawn(move || match runtime.block_on(task) {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => info!(pid, "Process task aborted"),
                Err(e) => error!(pid, error = %e, "Process task panicked"),
            })?;

        Ok(Self { abort, thread })
    }

    fn is_running(&self) -> bool {
        !self.thread.is_finished()
    }

    /// Cancellation lands at the app's next await point
    fn terminate(self) {
        self.abort.abort();
    }
}
