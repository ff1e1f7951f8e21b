use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::input_handler::spatial::centered;
use crate::input_handler::{Control, Frame, Point, ScreenBounds, Size};

/// Short random alphanumeric identifier, unique among live windows of a desktop
pub type WindowId = String;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// Drawn at its stored size and position
    Normal,
    /// Shrunk to nothing; only reachable again through the taskbar
    Minimized,
    /// Spanning the screen between the chrome margins
    Maximized,
    /// Delete animation in flight; removed once it completes
    ClosingAnimating,
}

impl fmt::Display for WindowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WindowState::Normal => "normal",
            WindowState::Minimized => "minimized",
            WindowState::Maximized => "maximized",
            WindowState::ClosingAnimating => "closing",
        };
        f.write_str(label)
    }
}

/// Which title bar buttons are enabled
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TitleBarControls {
    pub close: bool,
    pub minimize: bool,
    pub maximize: bool,
}

impl Default for TitleBarControls {
    fn default() -> Self {
        Self {
            close: true,
            minimize: true,
            maximize: true,
        }
    }
}

impl TitleBarControls {
    pub fn allows(&self, control: Control) -> bool {
        match control {
            Control::Close => self.close,
            Control::Minimize => self.minimize,
            Control::Maximize => self.maximize,
        }
    }

    /// Enabled controls in title bar order
    pub fn enabled(&self) -> Vec<Control> {
        [Control::Close, Control::Minimize, Control::Maximize]
            .into_iter()
            .filter(|control| self.allows(*control))
            .collect()
    }
}

/// What the window should do after its content handled an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAction {
    Ignore,
    Close,
}

/// The body of a window. Windows own their content instead of subclassing it.
pub trait WindowContent: Send {
    /// Plain text lines drawn inside the window
    fn lines(&self) -> Vec<String> {
        Vec::new()
    }

    /// Named buttons drawn along the bottom of the window
    fn actions(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called when one of `actions()` is pressed
    fn on_action(&mut self, _name: &str) -> ContentAction {
        ContentAction::Ignore
    }
}

/// Static text content
#[derive(Debug, Clone, Default)]
pub struct TextContent {
    lines: Vec<String>,
}

impl TextContent {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl WindowContent for TextContent {
    fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }
}

/// Options for creating a window
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    /// Cells wide and tall (None = desktop default)
    pub size: Option<Size>,
    /// Initial top-left position (None = centered on the screen)
    pub position: Option<Point>,
    pub controls: TitleBarControls,
    /// Whether a title bar is drawn at all
    pub title_bar: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: None,
            position: None,
            controls: TitleBarControls::default(),
            title_bar: true,
        }
    }
}

impl WindowConfig {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Derive the taskbar key of a title: lowercased, spaces become hyphens
pub fn taskbar_key(title: &str) -> String {
    title.replace(' ', "-").to_lowercase()
}

pub(crate) fn generate_window_id() -> WindowId {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Exclusive right to write a window's geometry from an animation.
/// Released when dropped.
pub(crate) struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    pub(crate) fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One on-screen window
pub struct Window {
    pub(crate) id: WindowId,
    pub(crate) title: String,
    /// Stored normal geometry: restore target and hit box
    pub(crate) home: Frame,
    /// Live geometry, moved by animations
    pub(crate) frame: Frame,
    pub(crate) state: WindowState,
    pub(crate) controls: TitleBarControls,
    pub(crate) has_title_bar: bool,
    pub(crate) primary: bool,
    pub(crate) busy: Arc<AtomicBool>,
    pub(crate) content: Box<dyn WindowContent>,
}

impl Window {
    /// Create a window; `default_size` applies when the config leaves size open
    pub fn new(
        config: WindowConfig,
        content: impl WindowContent + 'static,
        default_size: Size,
        screen: ScreenBounds,
    ) -> Self {
        let size = config.size.unwrap_or(default_size);
        let position = config
            .position
            .unwrap_or_else(|| centered(size, screen));
        let home = Frame::new(position, size);

        Self {
            id: generate_window_id(),
            title: config.title,
            home,
            frame: home,
            state: WindowState::Normal,
            controls: config.controls,
            has_title_bar: config.title_bar,
            primary: false,
            busy: Arc::new(AtomicBool::new(false)),
            content: Box::new(content),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn taskbar_key(&self) -> String {
        taskbar_key(&self.title)
    }

    /// Stored (normal) size
    pub fn size(&self) -> Size {
        self.home.size
    }

    /// Stored (normal) position
    pub fn position(&self) -> Point {
        self.home.position
    }

    /// Live geometry, including animation progress
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn controls(&self) -> TitleBarControls {
        self.controls
    }

    pub fn has_title_bar(&self) -> bool {
        self.has_title_bar
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Rows added below the stored size by the title bar and frame
    pub fn padding(&self) -> i32 {
        if self.has_title_bar {
            4
        } else {
            3
        }
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            id: self.id.clone(),
            title: self.title.clone(),
            taskbar_key: self.taskbar_key(),
            home: self.home,
            frame: self.frame,
            state: self.state,
            controls: self.controls,
            has_title_bar: self.has_title_bar,
            padding: self.padding(),
            primary: self.primary,
            busy: self.is_busy(),
            lines: self.content.lines(),
            actions: self.content.actions(),
        }
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("home", &self.home)
            .field("frame", &self.frame)
            .field("state", &self.state)
            .field("primary", &self.primary)
            .field("busy", &self.is_busy())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.title, self.id, self.state)
    }
}

/// Read-only copy of a window for renderers and logs
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct WindowSnapshot {
    pub id: WindowId,
    pub title: String,
    pub taskbar_key: String,
    pub home: Frame,
    pub frame: Frame,
    pub state: WindowState,
    pub controls: TitleBarControls,
    pub has_title_bar: bool,
    pub padding: i32,
    pub primary: bool,
    pub busy: bool,
    pub lines: Vec<String>,
    pub actions: Vec<String>,
}
