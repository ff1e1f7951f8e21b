// Core data structures for pointer routing and window geometry

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A cell position on the screen (or an offset between two positions)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Width and height in character cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0,
        height: 0,
    };

    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Position plus size: everything an animation interpolates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub position: Point,
    pub size: Size,
}

impl Frame {
    pub fn new(position: Point, size: Size) -> Self {
        Self { position, size }
    }

    /// Get the center cell of the frame
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2,
            self.position.y + self.size.height / 2,
        )
    }
}

/// Terminal dimensions as reported by the screen collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenBounds {
    pub columns: u16,
    pub rows: u16,
}

impl ScreenBounds {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self { columns, rows }
    }
}

/// Rows reserved at the screen edges for the header/taskbar and footer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromeMargins {
    pub top: i32,
    pub bottom: i32,
}

impl Default for ChromeMargins {
    fn default() -> Self {
        Self { top: 3, bottom: 1 }
    }
}

/// Title bar buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Control {
    Close,
    Minimize,
    Maximize,
}

impl Control {
    /// Parse from the control name carried by a button press
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "close" => Some(Control::Close),
            "minimize" => Some(Control::Minimize),
            "maximize" => Some(Control::Maximize),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Control::Close => "close",
            Control::Minimize => "minimize",
            Control::Maximize => "maximize",
        }
    }

    /// Single-cell glyph drawn on the title bar
    pub fn glyph(&self) -> char {
        match self {
            Control::Close => 'X',
            Control::Minimize => 'O',
            Control::Maximize => '█',
        }
    }
}

/// Input delivered to the desktop, one at a time, in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DesktopEvent {
    /// Primary button pressed at an absolute position
    PointerDown { at: Point },
    /// Primary button released
    PointerUp { at: Point },
    /// Pointer moved; `delta` is the change since the previous pointer event
    PointerMove { at: Point, delta: Point },
    /// A named button on a window was pressed (title bar control or content action)
    ControlPressed { window: String, name: String },
    /// A taskbar label was clicked
    TaskbarActivated { key: String },
}
