use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use self::pty::ProgramUnit;
use self::unit::{AppUnit, ExecutionUnit};
use crate::error::ProcessError;
use crate::state::Desktop;

pub mod ids;
pub mod pty;
mod unit;

pub type ProcessId = u32;

/// Identifier namespace for processes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessSettings {
    pub min_id: ProcessId,
    pub max_id: ProcessId,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            min_id: 1000,
            max_id: 9999,
        }
    }
}

/// What an application gets when it is started
#[derive(Clone)]
pub struct AppContext {
    pub pid: ProcessId,
    pub args: Vec<String>,
    pub desktop: Desktop,
}

/// Error returned by an application's entry point
pub type AppError = Box<dyn std::error::Error + Send + Sync>;

/// An application compiled into the shell
#[async_trait]
pub trait Application: Send + Sync {
    /// Entry point; runs on the process's own thread until it returns or is killed
    async fn main(&self, ctx: AppContext) -> Result<(), AppError>;
}

/// How a process is executed
#[derive(Clone)]
pub enum EntryPoint {
    Builtin(Arc<dyn Application>),
    /// External executable, run on a pseudo-terminal
    Program(PathBuf),
}

impl fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Builtin(_) => f.write_str("Builtin"),
            EntryPoint::Program(path) => f.debug_tuple("Program").field(path).finish(),
        }
    }
}

/// A registered unit of application execution
pub struct Process {
    id: ProcessId,
    name: String,
    entry: EntryPoint,
    unit: Option<ExecutionUnit>,
}

impl Process {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> &EntryPoint {
        &self.entry
    }

    pub fn is_started(&self) -> bool {
        self.unit.is_some()
    }

    fn info(&mut self) -> ProcessInfo {
        let running = self.unit.as_mut().is_some_and(ExecutionUnit::is_running);
        ProcessInfo {
            id: self.id,
            name: self.name.clone(),
            program: match &self.entry {
                EntryPoint::Program(path) => Some(path.clone()),
                EntryPoint::Builtin(_) => None,
            },
            started: self.unit.is_some(),
            running,
        }
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entry", &self.entry)
            .field("started", &self.is_started())
            .finish()
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.name, self.id)
    }
}

/// Serializable view of a process
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ProcessInfo {
    pub id: ProcessId,
    pub name: String,
    pub program: Option<PathBuf>,
    pub started: bool,
    pub running: bool,
}

/// Registry of processes. Cheap to clone; clones share the registry.
#[derive(Clone)]
pub struct ProcessManager {
    processes: Arc<Mutex<HashMap<ProcessId, Process>>>,
    desktop: Desktop,
    settings: ProcessSettings,
}

impl ProcessManager {
    pub fn new(desktop: Desktop, settings: ProcessSettings) -> Self {
        Self {
            processes: Arc::new(Mutex::new(HashMap::new())),
            desktop,
            settings,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProcessId, Process>> {
        self.processes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a process with an id unused by every registered process
    pub fn create(&self, name: impl Into<String>, entry: EntryPoint) -> Result<Process, ProcessError> {
        if let EntryPoint::Program(path) = &entry {
            if !path.is_file() {
                return Err(ProcessError::EntryPointNotFound(path.clone()));
            }
        }

        let existing: HashSet<ProcessId> = self.lock().keys().copied().collect();
        let id = ids::allocate(&existing, self.settings.min_id..=self.settings.max_id)?;

        Ok(Process {
            id,
            name: name.into(),
            entry,
            unit: None,
        })
    }

    pub fn register(&self, process: Process) -> Result<ProcessId, ProcessError> {
        let mut processes = self.lock();
        if processes.contains_key(&process.id) {
            return Err(ProcessError::DuplicateProcessId(process.id));
        }

        let id = process.id;
        info!(pid = id, name = %process.name, "Registered process");
        processes.insert(id, process);
        Ok(id)
    }

    /// Spawn the process's entry point with `args`
    pub fn start(&self, id: ProcessId, args: Vec<String>) -> Result<(), ProcessError> {
        let mut processes = self.lock();
        let process = processes
            .get_mut(&id)
            .ok_or(ProcessError::ProcessNotFound(id))?;

        if process.unit.is_some() {
            return Err(ProcessError::AlreadyStarted(id));
        }

        let unit = match &process.entry {
            EntryPoint::Builtin(app) => {
                let ctx = AppContext {
                    pid: id,
                    args,
                    desktop: self.desktop.clone(),
                };
                ExecutionUnit::App(AppUnit::spawn(id, process.name.clone(), Arc::clone(app), ctx)?)
            }
            EntryPoint::Program(path) => ExecutionUnit::Program(ProgramUnit::spawn(id, path, &args)?),
        };

        process.unit = Some(unit);
        info!(pid = id, name = %process.name, "Started process");
        Ok(())
    }

    /// Create, register and start in one go
    pub fn launch(
        &self,
        name: impl Into<String>,
        entry: EntryPoint,
        args: Vec<String>,
    ) -> Result<ProcessId, ProcessError> {
        let process = self.create(name, entry)?;
        let id = self.register(process)?;
        if let Err(e) = self.start(id, args) {
            self.lock().remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    /// Forcibly stop a started process and unregister it
    pub fn kill(&self, id: ProcessId) -> Result<Process, ProcessError> {
        let mut processes = self.lock();
        let process = processes
            .get_mut(&id)
            .ok_or(ProcessError::ProcessNotFound(id))?;

        let Some(unit) = process.unit.take() else {
            warn!(pid = id, "Kill requested for a process that was never started");
            return Err(ProcessError::NotStarted(id));
        };

        let process = processes
            .remove(&id)
            .ok_or(ProcessError::ProcessNotFound(id))?;
        drop(processes);

        unit.terminate()?;
        info!(pid = id, name = %process.name, "Killed process");
        Ok(process)
    }

    /// Discard a registered process that was never started
    pub fn unregister(&self, id: ProcessId) -> Result<Process, ProcessError> {
        let mut processes = self.lock();
        match processes.get(&id) {
            None => Err(ProcessError::ProcessNotFound(id)),
            Some(process) if process.is_started() => Err(ProcessError::AlreadyStarted(id)),
            Some(_) => processes
                .remove(&id)
                .ok_or(ProcessError::ProcessNotFound(id)),
        }
    }

    /// Kill everything that was started; used at shutdown
    pub fn kill_all(&self) {
        let started: Vec<ProcessId> = self
            .lock()
            .values()
            .filter(|p| p.is_started())
            .map(|p| p.id)
            .collect();

        for id in started {
            if let Err(e) = self.kill(id) {
                warn!(pid = id, error = %e, "Failed to kill process at shutdown");
            }
        }
    }

    pub fn process_count(&self) -> usize {
        self.lock().len()
    }

    pub fn is_running(&self, id: ProcessId) -> Result<bool, ProcessError> {
        let mut processes = self.lock();
        let process = processes
            .get_mut(&id)
            .ok_or(ProcessError::ProcessNotFound(id))?;
        Ok(process.unit.as_mut().is_some_and(ExecutionUnit::is_running))
    }

    pub fn list(&self) -> Vec<ProcessInfo> {
        let mut infos: Vec<_> = self.lock().values_mut().map(Process::info).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    fn with_program<T>(
        &self,
        id: ProcessId,
        f: impl FnOnce(&ProgramUnit) -> Result<T, ProcessError>,
    ) -> Result<T, ProcessError> {
        let processes = self.lock();
        let process = processes.get(&id).ok_or(ProcessError::ProcessNotFound(id))?;
        match &process.unit {
            Some(ExecutionUnit::Program(program)) => f(program),
            Some(ExecutionUnit::App(_)) => Err(ProcessError::NotAProgram(id)),
            None if matches!(process.entry, EntryPoint::Builtin(_)) => Err(ProcessError::NotAProgram(id)),
            None => Err(ProcessError::NotStarted(id)),
        }
    }

    /// Drain what an external program printed since the last read
    pub fn read_output(&self, id: ProcessId) -> Result<Vec<u8>, ProcessError> {
        self.with_program(id, |program| Ok(program.read()))
    }

    pub fn write_input(&self, id: ProcessId, data: &[u8]) -> Result<(), ProcessError> {
        self.with_program(id, |program| program.write(data))
    }

    pub fn resize_terminal(&self, id: ProcessId, rows: u16, cols: u16) -> Result<(), ProcessError> {
        self.with_program(id, |program| program.resize(rows, cols))
    }
}
