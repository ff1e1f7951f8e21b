use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};

use self::taskbar::{Taskbar, TaskbarEntryHandle};
use self::window::{generate_window_id, Window, WindowConfig, WindowContent, WindowId, WindowSnapshot, WindowState};
use crate::error::DesktopError;
use crate::input_handler::spatial::{maximized_contains, window_contains};
use crate::input_handler::{ChromeMargins, Frame, Point, ScreenBounds, Size};

pub mod animation;
pub mod dialog;
pub mod taskbar;
pub mod window;

/// Source of the current terminal dimensions
pub trait Screen: Send + Sync {
    fn bounds(&self) -> ScreenBounds;
}

/// A screen of fixed size (tests, headless runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedScreen(pub ScreenBounds);

impl Screen for FixedScreen {
    fn bounds(&self) -> ScreenBounds {
        self.0
    }
}

/// Tunables of the window manager, read from the boot config
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopSettings {
    pub chrome: ChromeMargins,
    /// Length of every window transition
    pub animation_ms: u64,
    /// Time between two animation steps
    pub frame_ms: u64,
    pub default_window: Size,
}

impl Default for DesktopSettings {
    fn default() -> Self {
        Self {
            chrome: ChromeMargins::default(),
            animation_ms: 333,
            frame_ms: 33,
            default_window: Size::new(50, 12),
        }
    }
}

impl DesktopSettings {
    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

pub(crate) struct DesktopState {
    pub(crate) windows: HashMap<WindowId, Window>,
    /// Back-to-front drawing order; the last ID is the front-most window
    pub(crate) window_stack: Vec<WindowId>,
    pub(crate) selected: Option<WindowId>,
    pub(crate) taskbar: Taskbar,
    /// Window currently followed by pointer moves
    pub(crate) drag: Option<WindowId>,
}

impl DesktopState {
    fn new() -> Self {
        Self {
            windows: HashMap::new(),
            window_stack: Vec::new(),
            selected: None,
            taskbar: Taskbar::new(),
            drag: None,
        }
    }

    pub(crate) fn window(&self, id: &str) -> Result<&Window, DesktopError> {
        self.windows
            .get(id)
            .ok_or_else(|| DesktopError::WindowNotFound(id.to_string()))
    }

    pub(crate) fn window_mut(&mut self, id: &str) -> Result<&mut Window, DesktopError> {
        self.windows
            .get_mut(id)
            .ok_or_else(|| DesktopError::WindowNotFound(id.to_string()))
    }

    /// Clear the primary marker everywhere and the taskbar highlight
    pub(crate) fn clear_selection(&mut self) {
        for window in self.windows.values_mut() {
            window.primary = false;
        }
        self.selected = None;
        self.taskbar.activate_window(None);
    }

    fn raise(&mut self, id: &str) {
        if let Some(index) = self.window_stack.iter().position(|x| x == id) {
            let id = self.window_stack.remove(index);
            self.window_stack.push(id);
        }
    }
}

/// The window manager. Cheap to clone; every clone drives the same desktop.
#[derive(Clone)]
pub struct Desktop {
    pub(crate) inner: Arc<Mutex<DesktopState>>,
    pub(crate) settings: Arc<DesktopSettings>,
    screen: Arc<dyn Screen>,
    pub(crate) runtime: Handle,
}

impl Desktop {
    /// Create an empty desktop; animations are spawned on `runtime`
    pub fn new(settings: DesktopSettings, screen: Arc<dyn Screen>, runtime: Handle) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DesktopState::new())),
            settings: Arc::new(settings),
            screen,
            runtime,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DesktopState> {
        // Every mutation completes before its guard drops, so a poisoned
        // lock still holds consistent state
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> &DesktopSettings {
        &self.settings
    }

    pub fn screen_bounds(&self) -> ScreenBounds {
        self.screen.bounds()
    }

    /// Build a window sized and centered for this desktop
    pub fn create_window(
        &self,
        config: WindowConfig,
        content: impl WindowContent + 'static,
    ) -> Window {
        Window::new(
            config,
            content,
            self.settings.default_window,
            self.screen_bounds(),
        )
    }

    /// Add a window to the desktop and register its taskbar entry
    pub fn mount(&self, mut window: Window) -> Result<TaskbarEntryHandle, DesktopError> {
        let mut state = self.lock();

        while state.windows.contains_key(&window.id) {
            window.id = generate_window_id();
        }

        let handle = state.taskbar.register(&window.title, &window.id)?;
        info!(window = %window.id, title = %window.title, "Window mounted");

        state.window_stack.push(window.id.clone());
        state.windows.insert(window.id.clone(), window);
        Ok(handle)
    }

    /// Make `id` the primary window and bring it to the front.
    /// A minimized window is restored.
    pub fn select(&self, id: &str) -> Result<(), DesktopError> {
        let minimized = {
            let mut state = self.lock();
            state.window(id)?;

            for window in state.windows.values_mut() {
                window.primary = window.id == id;
            }
            state.selected = Some(id.to_string());
            state.taskbar.activate_window(Some(id));
            state.raise(id);

            debug!(window = %id, "Window selected");
            state.window(id)?.state == WindowState::Minimized
        };

        if minimized {
            if let Err(e) = self.restore(id) {
                debug!(window = %id, error = %e, "Restore on select dropped");
            }
        }
        Ok(())
    }

    /// Drop the window's taskbar entry and its selection; it stays on screen
    pub fn deselect(&self, id: &str) -> Result<(), DesktopError> {
        let mut state = self.lock();
        state.window_mut(id)?.primary = false;
        state.taskbar.unregister_window(id);

        if state.selected.as_deref() == Some(id) {
            state.selected = None;
            state.taskbar.activate_window(None);
        }

        debug!(window = %id, "Window deselected");
        Ok(())
    }

    /// Whether `point` lies inside the window's hit box
    pub fn hit_test(&self, id: &str, point: Point) -> Result<bool, DesktopError> {
        let state = self.lock();
        let window = state.window(id)?;
        Ok(self.contains(window, point))
    }

    fn contains(&self, window: &Window, point: Point) -> bool {
        if window.state == WindowState::Maximized {
            maximized_contains(self.screen_bounds(), self.settings.chrome, point)
        } else {
            window_contains(&window.home, window.padding(), point)
        }
    }

    /// Front-most visible window under `point`
    pub fn window_at(&self, point: Point) -> Option<WindowId> {
        let state = self.lock();
        state
            .window_stack
            .iter()
            .rev()
            .filter_map(|id| state.windows.get(id))
            .filter(|w| matches!(w.state, WindowState::Normal | WindowState::Maximized))
            .find(|w| self.contains(w, point))
            .map(|w| w.id.clone())
    }

    /// Start a drag gesture if the press lands inside an idle window
    pub fn begin_drag(&self, id: &str, point: Point) -> Result<bool, DesktopError> {
        let mut state = self.lock();
        let window = state.window(id)?;

        if window.is_busy() || !self.contains(window, point) {
            return Ok(false);
        }
        state.drag = Some(id.to_string());
        Ok(true)
    }

    pub fn end_drag(&self) {
        self.lock().drag = None;
    }

    /// Window currently being dragged
    pub fn dragging(&self) -> Option<WindowId> {
        self.lock().drag.clone()
    }

    /// Follow a pointer move during a drag. Returns whether the window moved.
    ///
    /// Leaving the hit box ends the drag. A maximized window first snaps back
    /// to its stored size, centered under the pointer.
    pub fn drag_update(&self, id: &str, pointer: Point, delta: Point) -> Result<bool, DesktopError> {
        let mut state = self.lock();
        let window = state.window(id)?;

        // Animations own the geometry while busy
        if window.is_busy() || state.drag.as_deref() != Some(id) {
            return Ok(false);
        }

        if !self.contains(window, pointer) {
            state.drag = None;
            debug!(window = %id, "Pointer left window, drag ended");
            return Ok(false);
        }

        let chrome_top = self.settings.chrome.top;
        let window = state.window_mut(id)?;

        if window.state == WindowState::Maximized {
            let size = window.home.size;
            window.home.position = Point::new(
                pointer.x - size.width / 2,
                pointer.y - size.height / 2 - chrome_top,
            );
            window.state = WindowState::Normal;
            debug!(window = %id, "Maximized window snapped back for drag");
        } else {
            window.home.position = window.home.position + delta;
        }
        window.frame = window.home;
        Ok(true)
    }

    /// Unregister a window from the desktop and the taskbar
    pub fn remove(&self, id: &str) -> Result<Window, DesktopError> {
        let mut state = self.lock();
        let window = state
            .windows
            .remove(id)
            .ok_or_else(|| DesktopError::WindowNotFound(id.to_string()))?;

        state.window_stack.retain(|x| x != id);
        state.taskbar.unregister_window(id);
        if state.selected.as_deref() == Some(id) {
            state.selected = None;
        }
        let selected = state.selected.clone();
        state.taskbar.activate_window(selected.as_deref());
        if state.drag.as_deref() == Some(id) {
            state.drag = None;
        }

        info!(window = %id, "Window removed from desktop");
        Ok(window)
    }

    /// Change a window title and re-key its taskbar entry. Returns the old title.
    pub fn set_title(&self, id: &str, title: impl Into<String>) -> Result<String, DesktopError> {
        let title = title.into();
        let mut state = self.lock();
        state.window(id)?;
        state.taskbar.relabel(id, &title)?;

        let window = state.window_mut(id)?;
        Ok(std::mem::replace(&mut window.title, title))
    }

    pub fn find_by_title(&self, title: &str) -> Option<WindowId> {
        self.lock()
            .windows
            .values()
            .find(|w| w.title == title)
            .map(|w| w.id.clone())
    }

    pub fn window(&self, id: &str) -> Option<WindowSnapshot> {
        self.lock().windows.get(id).map(Window::snapshot)
    }

    /// All windows, back to front
    pub fn snapshot(&self) -> Vec<WindowSnapshot> {
        let state = self.lock();
        state
            .window_stack
            .iter()
            .filter_map(|id| state.windows.get(id))
            .map(Window::snapshot)
            .collect()
    }

    pub fn taskbar(&self) -> Taskbar {
        self.lock().taskbar.clone()
    }

    pub fn selected(&self) -> Option<WindowId> {
        self.lock().selected.clone()
    }

    pub fn window_count(&self) -> usize {
        self.lock().windows.len()
    }

    pub(crate) fn frame_of(&self, id: &str) -> Option<Frame> {
        self.lock().windows.get(id).map(|w| w.frame)
    }
}
