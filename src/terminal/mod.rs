use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tracing::{info, warn};

use self::render::View;
use crate::apps;
use crate::error::ShellError;
use crate::input_handler::{DesktopEvent, Point, ScreenBounds};
use crate::process::{ProcessId, ProcessManager};
use crate::state::{Desktop, Screen};

pub mod render;

/// Size of the controlling terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalScreen;

impl Screen for TerminalScreen {
    fn bounds(&self) -> ScreenBounds {
        let (columns, rows) = crossterm::terminal::size().unwrap_or((80, 24));
        ScreenBounds::new(columns, rows)
    }
}

/// Raw mode, alternate screen and mouse capture for as long as it lives
struct Session {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Session {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best effort; the process is on its way out
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Turns raw mouse reports into desktop events
#[derive(Debug, Default)]
pub(crate) struct PointerTracker {
    last: Point,
}

impl PointerTracker {
    pub(crate) fn translate(&mut self, mouse: MouseEvent, view: &View) -> Option<DesktopEvent> {
        let at = Point::new(i32::from(mouse.column), i32::from(mouse.row));
        let delta = at - self.last;
        self.last = at;

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                Some(render::hit(view, at).unwrap_or(DesktopEvent::PointerDown { at }))
            }
            MouseEventKind::Drag(MouseButton::Left) => Some(DesktopEvent::PointerMove { at, delta }),
            MouseEventKind::Up(MouseButton::Left) => Some(DesktopEvent::PointerUp { at }),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Keyboard commands and bookkeeping of the interactive shell
struct Shell<'a> {
    desktop: &'a Desktop,
    processes: &'a ProcessManager,
    user: String,
    launched: Vec<ProcessId>,
    opened: usize,
    status: String,
}

impl Shell<'_> {
    fn header(&self) -> String {
        format!(
            " termdesk | {} | windows: {} | processes: {}",
            self.user,
            self.desktop.window_count(),
            self.processes.process_count()
        )
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') => Flow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Flow::Quit,
            KeyCode::Char('n') => {
                self.opened += 1;
                let title = format!("Welcome {}", self.opened);
                match apps::launch_welcome(self.processes, &title, &self.user) {
                    Ok(pid) => {
                        self.launched.push(pid);
                        self.status = format!("Launched {} as process {}", title, pid);
                    }
                    Err(e) => self.report(e.to_string()),
                }
                Flow::Continue
            }
            KeyCode::Char('x') => {
                match self.launched.pop() {
                    Some(pid) => match self.processes.kill(pid) {
                        Ok(process) => self.status = format!("Killed {}", process),
                        Err(e) => self.report(e.to_string()),
                    },
                    None => self.status = "Nothing to kill".to_string(),
                }
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn report(&mut self, message: String) {
        warn!(error = %message, "Request failed");
        self.status = message;
    }
}

/// Drive the desktop from the terminal until the user quits
pub fn run(
    desktop: &Desktop,
    processes: &ProcessManager,
    user: &str,
    launched: Vec<ProcessId>,
) -> Result<(), ShellError> {
    let mut session = Session::enter()?;
    let mut pointer = PointerTracker::default();
    let mut shell = Shell {
        desktop,
        processes,
        user: user.to_string(),
        opened: launched.len(),
        launched,
        status: " n new window | x kill last | q quit".to_string(),
    };
    let tick = desktop.settings().frame_interval();
    info!("Terminal session started");

    loop {
        let view = View::capture(desktop, shell.header(), shell.status.clone());
        session.terminal.draw(|f| render::draw(f, &view))?;

        if !event::poll(tick)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if shell.on_key(key) == Flow::Quit {
                    break;
                }
            }
            Event::Mouse(mouse) => {
                if let Some(event) = pointer.translate(mouse, &view) {
                    if let Err(e) = desktop.handle_event(event) {
                        shell.report(e.to_string());
                    }
                }
            }
            // Screen bounds are read live, the next draw picks the new size up
            _ => {}
        }
    }

    info!("Terminal session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::{desktop, mount_titled};

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[tokio::test]
    async fn test_pointer_translation() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let view = View::capture(&desktop, String::new(), String::new());
        let mut tracker = PointerTracker::default();

        assert_eq!(
            tracker.translate(mouse(MouseEventKind::Down(MouseButton::Left), 0, 30), &view),
            Some(DesktopEvent::PointerDown { at: Point::new(0, 30) })
        );
        assert_eq!(
            tracker.translate(mouse(MouseEventKind::Drag(MouseButton::Left), 3, 31), &view),
            Some(DesktopEvent::PointerMove {
                at: Point::new(3, 31),
                delta: Point::new(3, 1)
            })
        );
        assert_eq!(
            tracker.translate(mouse(MouseEventKind::Up(MouseButton::Left), 3, 31), &view),
            Some(DesktopEvent::PointerUp { at: Point::new(3, 31) })
        );
        assert_eq!(
            tracker.translate(mouse(MouseEventKind::Moved, 5, 5), &view),
            None
        );

        // Presses on a title bar glyph become control presses
        let w = &view.windows[0];
        let close = Point::new(w.frame.position.x + 2, w.frame.position.y + 1);
        assert_eq!(
            tracker.translate(
                mouse(MouseEventKind::Down(MouseButton::Left), close.x as u16, close.y as u16),
                &view
            ),
            Some(DesktopEvent::ControlPressed {
                window: id,
                name: "close".to_string()
            })
        );
    }
}
