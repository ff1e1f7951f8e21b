use portable_pty::{native_pty_system, Child, CommandBuilder, PtyPair, PtySize};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use super::ProcessId;
use crate::error::ProcessError;

/// Environment variable carrying the process id into external programs
pub const PID_ENV: &str = "TERMDESK_PID";

/// Unread output kept per program; older bytes are dropped first
pub const OUTPUT_LIMIT: usize = 64 * 1024;

/// An external program with a thread-safe output buffer
pub(crate) struct ProgramUnit {
    pair: PtyPair,
    child: Box<dyn Child + Send + Sync>,
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
    output: Arc<Mutex<Vec<u8>>>,
    alive: Arc<AtomicBool>,
}

impl ProgramUnit {
    /// Spawn `path` with `args` on a fresh PTY and start draining its output
    pub(crate) fn spawn(pid: ProcessId, path: &Path, args: &[String]) -> Result<Self, ProcessError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ProcessError::Pty(format!("Failed to open PTY: {}", e)))?;

        let mut cmd = CommandBuilder::new(path);
        cmd.args(args);
        cmd.env(PID_ENV, pid.to_string());

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| ProcessError::Pty(format!("Failed to spawn {}: {}", path.display(), e)))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| ProcessError::Pty(format!("Failed to clone PTY reader: {}", e)))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| ProcessError::Pty(format!("Failed to take PTY writer: {}", e)))?;

        let output = Arc::new(Mutex::new(Vec::new()));
        let alive = Arc::new(AtomicBool::new(true));

        let buffer = Arc::clone(&output);
        let running = Arc::clone(&alive);
        thread::Builder::new()
            .name(format!("pty-reader-{}", pid))
            .spawn(move || drain_output(pid, reader, buffer, running))?;

        Ok(Self {
            pair,
            child,
            writer: Arc::new(Mutex::new(writer)),
            output,
            alive,
        })
    }

    pub(crate) fn write(&self, data: &[u8]) -> Result<(), ProcessError> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    /// Take everything the program printed since the last call
    pub(crate) fn read(&self) -> Vec<u8> {
        let mut buffer = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buffer)
    }

    pub(crate) fn resize(&self, rows: u16, cols: u16) -> Result<(), ProcessError> {
        self.pair
            .master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| ProcessError::Pty(format!("Failed to resize PTY: {}", e)))
    }

    pub(crate) fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    pub(crate) fn terminate(mut self) -> Result<(), ProcessError> {
        self.alive.store(false, Ordering::Release);

        // The reader sees EOF once the child is gone
        if let Err(e) = self.child.kill() {
            // Already exited on its own
            warn!(error = %e, "Failed to kill child process");
        }
        self.child.wait()?;
        Ok(())
    }
}

fn drain_output(
    pid: ProcessId,
    mut reader: Box<dyn Read + Send>,
    buffer: Arc<Mutex<Vec<u8>>>,
    alive: Arc<AtomicBool>,
) {
    debug!(pid, "PTY reader started");
    let mut buf = [0u8; 1024];

    while alive.load(Ordering::Acquire) {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!(pid, "EOF received, program ended");
                break;
            }
            Ok(n) => {
                let mut output = buffer.lock().unwrap_or_else(PoisonError::into_inner);
                append_capped(&mut output, &buf[..n], OUTPUT_LIMIT);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                debug!(pid, error = %e, "PTY read error");
                break;
            }
        }
    }
    debug!(pid, "PTY reader exiting");
}

/// Append `data`, keeping only the newest `limit` bytes
fn append_capped(buffer: &mut Vec<u8>, data: &[u8], limit: usize) {
    if data.len() >= limit {
        buffer.clear();
        buffer.extend_from_slice(&data[data.len() - limit..]);
        return;
    }

    let overflow = (buffer.len() + data.len()).saturating_sub(limit);
    buffer.drain(..overflow);
    buffer.extend_from_slice(data);
}
