use serde::Serialize;

use super::window::{taskbar_key, WindowId};
use crate::error::DesktopError;

/// Label of the permanent entry that stands for the bare desktop
pub const DESKTOP_ENTRY: &str = "Desktop";

#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct TaskbarEntry {
    pub key: String,
    pub label: String,
    /// None only for the desktop entry
    pub window: Option<WindowId>,
}

/// Returned by `Desktop::mount`; identifies the window and its taskbar entry
#[derive(Clone, Serialize, Debug, PartialEq, Eq)]
pub struct TaskbarEntryHandle {
    pub key: String,
    pub window: WindowId,
}

/// Ordered window switcher with at most one active entry
#[derive(Clone, Serialize, Debug)]
pub struct Taskbar {
    entries: Vec<TaskbarEntry>,
    active: Option<String>,
}

impl Default for Taskbar {
    fn default() -> Self {
        Self::new()
    }
}

impl Taskbar {
    pub fn new() -> Self {
        Self {
            entries: vec![TaskbarEntry {
                key: taskbar_key(DESKTOP_ENTRY),
                label: DESKTOP_ENTRY.to_string(),
                window: None,
            }],
            active: None,
        }
    }

    pub fn entries(&self) -> &[TaskbarEntry] {
        &self.entries
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn entry(&self, key: &str) -> Option<&TaskbarEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn key_for(&self, window: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.window.as_deref() == Some(window))
            .map(|e| e.key.as_str())
    }

    pub fn is_desktop_key(key: &str) -> bool {
        key == taskbar_key(DESKTOP_ENTRY)
    }

    /// Add an entry for a window; fails without side effects on a key collision
    pub(crate) fn register(
        &mut self,
        label: &str,
        window: &str,
    ) -> Result<TaskbarEntryHandle, DesktopError> {
        let key = taskbar_key(label);
        if self.entry(&key).is_some() {
            return Err(DesktopError::DuplicateTaskbarKey(key));
        }

        self.entries.push(TaskbarEntry {
            key: key.clone(),
            label: label.to_string(),
            window: Some(window.to_string()),
        });

        Ok(TaskbarEntryHandle {
            key,
            window: window.to_string(),
        })
    }

    /// Remove a window's entry, clearing the active marker if it pointed there
    pub(crate) fn unregister_window(&mut self, window: &str) -> Option<TaskbarEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.window.as_deref() == Some(window))?;
        let entry = self.entries.remove(index);

        if self.active.as_deref() == Some(entry.key.as_str()) {
            self.active = None;
        }
        Some(entry)
    }

    /// Re-key a window's entry after a title change
    pub(crate) fn relabel(&mut self, window: &str, label: &str) -> Result<(), DesktopError> {
        let key = taskbar_key(label);
        if let Some(existing) = self.entry(&key) {
            if existing.window.as_deref() != Some(window) {
                return Err(DesktopError::DuplicateTaskbarKey(key));
            }
        }

        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.window.as_deref() == Some(window))
        else {
            return Ok(());
        };

        let was_active = self.active.as_deref() == Some(entry.key.as_str());
        entry.key = key.clone();
        entry.label = label.to_string();
        if was_active {
            self.active = Some(key);
        }
        Ok(())
    }

    /// Highlight the entry of `window`, or nothing
    pub(crate) fn activate_window(&mut self, window: Option<&str>) {
        self.active = window.and_then(|id| self.key_for(id)).map(str::to_string);
    }
}
