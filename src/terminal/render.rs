use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::input_handler::{ChromeMargins, Control, DesktopEvent, Point, ScreenBounds};
use crate::state::taskbar::Taskbar;
use crate::state::window::{WindowSnapshot, WindowState};
use crate::state::Desktop;

/// Everything needed to draw one frame, copied out of the desktop
pub struct View {
    pub windows: Vec<WindowSnapshot>,
    pub taskbar: Taskbar,
    pub bounds: ScreenBounds,
    pub chrome: ChromeMargins,
    pub header: String,
    pub status: String,
}

impl View {
    pub fn capture(desktop: &Desktop, header: String, status: String) -> Self {
        Self {
            windows: desktop.snapshot(),
            taskbar: desktop.taskbar(),
            bounds: desktop.screen_bounds(),
            chrome: desktop.settings().chrome,
            header,
            status,
        }
    }

    /// Rows between the taskbar chrome and the footer
    fn desktop_area(&self) -> Area {
        Area {
            x: 0,
            y: self.chrome.top,
            width: i32::from(self.bounds.columns),
            height: i32::from(self.bounds.rows) - self.chrome.top - self.chrome.bottom,
        }
    }
}

/// Signed rectangle; windows may hang off screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Area {
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    /// Visible part inside `clip`
    fn clip(&self, clip: Area) -> Option<Rect> {
        let left = self.x.max(clip.x).max(0);
        let top = self.y.max(clip.y).max(0);
        let right = (self.x + self.width).min(clip.x + clip.width);
        let bottom = (self.y + self.height).min(clip.y + clip.height);

        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            u16::try_from(left).ok()?,
            u16::try_from(top).ok()?,
            u16::try_from(right - left).ok()?,
            u16::try_from(bottom - top).ok()?,
        ))
    }
}

/// Where each part of a window lands on screen
#[derive(Debug, Clone, PartialEq)]
pub struct WindowLayout {
    pub outer: Area,
    pub controls: Vec<(Control, Area)>,
    pub body: Area,
    pub actions: Vec<(String, Area)>,
}

/// Lay out a window from its live frame. The outer box covers exactly the
/// cells of the hit box. Hidden windows and frames too small to draw get None.
pub fn window_layout(window: &WindowSnapshot, bounds: ScreenBounds, chrome: ChromeMargins) -> Option<WindowLayout> {
    let outer = match window.state {
        WindowState::Minimized => return None,
        WindowState::Maximized if !window.busy => Area {
            x: 0,
            y: chrome.top + 1,
            width: i32::from(bounds.columns),
            height: i32::from(bounds.rows) - chrome.bottom - chrome.top - 1,
        },
        _ => Area {
            x: window.frame.position.x,
            y: window.frame.position.y,
            width: window.frame.size.width + 1,
            height: window.frame.size.height + window.padding + 1,
        },
    };
    if outer.width < 3 || outer.height < 3 {
        return None;
    }

    let title_rows = i32::from(window.has_title_bar);
    let action_rows = i32::from(!window.actions.is_empty());

    let controls = if window.has_title_bar {
        window
            .controls
            .enabled()
            .into_iter()
            .enumerate()
            .map(|(i, control)| {
                let area = Area {
                    x: outer.x + 1 + 3 * i as i32,
                    y: outer.y + 1,
                    width: 3,
                    height: 1,
                };
                (control, area)
            })
            .collect()
    } else {
        Vec::new()
    };

    let body = Area {
        x: outer.x + 1,
        y: outer.y + 1 + title_rows,
        width: outer.width - 2,
        height: (outer.height - 2 - title_rows - action_rows).max(0),
    };

    let mut actions = Vec::new();
    let mut x = outer.x + 2;
    for label in &window.actions {
        let width = label.chars().count() as i32 + 2;
        actions.push((
            label.clone(),
            Area {
                x,
                y: outer.y + outer.height - 2,
                width,
                height: 1,
            },
        ));
        x += width + 1;
    }

    Some(WindowLayout {
        outer,
        controls,
        body,
        actions,
    })
}

/// Taskbar labels as `(key, text, area)`, left to right
pub fn taskbar_layout(taskbar: &Taskbar, chrome: ChromeMargins) -> Vec<(String, String, Area)> {
    let y = (chrome.top - 2).max(0);
    let mut x = 1;
    let mut spans = Vec::new();

    for entry in taskbar.entries() {
        let text = format!(" {} ", entry.label);
        let width = text.chars().count() as i32;
        spans.push((
            entry.key.clone(),
            text,
            Area {
                x,
                y,
                width,
                height: 1,
            },
        ));
        // one cell for the separator
        x += width + 1;
    }
    spans
}

/// Map a press to a button event: a taskbar label, a title bar control or a
/// content action of the front-most window under the pointer. Presses
/// anywhere else return None and become plain pointer presses.
pub fn hit(view: &View, at: Point) -> Option<DesktopEvent> {
    if let Some((key, _, _)) = taskbar_layout(&view.taskbar, view.chrome)
        .into_iter()
        .find(|(_, _, area)| area.contains(at))
    {
        return Some(DesktopEvent::TaskbarActivated { key });
    }

    let (window, layout) = view
        .windows
        .iter()
        .rev()
        .filter_map(|w| window_layout(w, view.bounds, view.chrome).map(|layout| (w, layout)))
        .find(|(_, layout)| layout.outer.contains(at))?;

    if let Some((control, _)) = layout.controls.iter().find(|(_, area)| area.contains(at)) {
        return Some(DesktopEvent::ControlPressed {
            window: window.id.clone(),
            name: control.name().to_string(),
        });
    }
    layout
        .actions
        .into_iter()
        .find(|(_, area)| area.contains(at))
        .map(|(label, _)| DesktopEvent::ControlPressed {
            window: window.id.clone(),
            name: label,
        })
}

fn highlight() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

pub fn draw(f: &mut Frame, view: &View) {
    let screen = f.area();
    let desktop = view.desktop_area();

    for window in &view.windows {
        draw_window(f, window, view, desktop);
    }

    if screen.height > 0 {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(view.header.clone(), highlight()))),
            Rect::new(0, 0, screen.width, 1),
        );
    }
    draw_taskbar(f, view, screen);

    if view.chrome.top >= 3 && screen.height > 2 {
        f.render_widget(
            Paragraph::new("─".repeat(screen.width as usize)),
            Rect::new(0, 2, screen.width, 1),
        );
    }
    if view.chrome.bottom > 0 && screen.height > 3 {
        f.render_widget(
            Paragraph::new(view.status.clone()),
            Rect::new(0, screen.height - 1, screen.width, 1),
        );
    }
}

fn draw_taskbar(f: &mut Frame, view: &View, screen: Rect) {
    let labels = taskbar_layout(&view.taskbar, view.chrome);
    let Some((_, _, first)) = labels.first() else {
        return;
    };
    let y = first.y;
    if y < 0 || y >= i32::from(screen.height) {
        return;
    }

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, text, _)) in labels.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("|"));
        }
        if view.taskbar.active() == Some(key.as_str()) {
            spans.push(Span::styled(text.clone(), highlight()));
        } else {
            spans.push(Span::raw(text.clone()));
        }
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect::new(0, y as u16, screen.width, 1),
    );
}

fn draw_window(f: &mut Frame, window: &WindowSnapshot, view: &View, clip: Area) {
    let Some(layout) = window_layout(window, view.bounds, view.chrome) else {
        return;
    };
    let Some(outer) = layout.outer.clip(clip) else {
        return;
    };

    let border = if window.primary {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    f.render_widget(Clear, outer);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!(" {} ", window.title)),
        outer,
    );

    for (control, area) in &layout.controls {
        if let Some(rect) = area.clip(clip) {
            f.render_widget(Paragraph::new(format!(" {} ", control.glyph())), rect);
        }
    }

    if let Some(body) = layout.body.clip(clip) {
        let lines: Vec<Line> = window.lines.iter().map(|l| Line::from(l.as_str())).collect();
        f.render_widget(Paragraph::new(lines), body);
    }

    for (label, area) in &layout.actions {
        if let Some(rect) = area.clip(clip) {
            f.render_widget(Paragraph::new(Span::styled(format!("[{}]", label), highlight())), rect);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_handler::{Frame as WindowFrame, Size};
    use crate::state::dialog::{Dialog, DialogButtons};
    use crate::state::tests::{desktop, mount_titled};
    use crate::state::window::TitleBarControls;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn snapshot(position: Point, size: Size) -> WindowSnapshot {
        let frame = WindowFrame::new(position, size);
        WindowSnapshot {
            id: "w1".to_string(),
            title: "Notes".to_string(),
            taskbar_key: "notes".to_string(),
            home: frame,
            frame,
            state: WindowState::Normal,
            controls: TitleBarControls::default(),
            has_title_bar: true,
            padding: 4,
            primary: true,
            busy: false,
            lines: vec!["hello".to_string()],
            actions: vec!["Ok".to_string()],
        }
    }

    fn view_of(desktop: &Desktop) -> View {
        View::capture(desktop, "termdesk".to_string(), "ready".to_string())
    }

    #[test]
    fn test_layout_matches_hit_box() {
        let w = snapshot(Point::new(10, 5), Size::new(20, 6));
        let layout = window_layout(&w, ScreenBounds::new(80, 24), ChromeMargins::default()).unwrap();

        assert_eq!(
            layout.outer,
            Area {
                x: 10,
                y: 5,
                width: 21,
                height: 11
            }
        );
        assert!(layout.outer.contains(Point::new(30, 15)));
        assert!(!layout.outer.contains(Point::new(31, 15)));

        assert_eq!(layout.controls.len(), 3);
        assert_eq!(layout.controls[0].0, Control::Close);
        assert_eq!(layout.controls[1].1.x, 14);
        assert_eq!(layout.body.y, 7);
        assert_eq!(layout.actions[0].1.y, 14);
    }

    #[test]
    fn test_minimized_and_collapsed_windows_have_no_layout() {
        let bounds = ScreenBounds::new(80, 24);
        let mut w = snapshot(Point::new(10, 5), Size::new(20, 6));
        w.state = WindowState::Minimized;
        assert!(window_layout(&w, bounds, ChromeMargins::default()).is_none());

        let w = snapshot(Point::ORIGIN, Size::new(0, 0));
        assert!(window_layout(&w, bounds, ChromeMargins::default()).is_none());
    }

    #[test]
    fn test_maximized_layout_fills_desktop() {
        let mut w = snapshot(Point::ORIGIN, Size::new(80, 19));
        w.state = WindowState::Maximized;
        let layout = window_layout(&w, ScreenBounds::new(80, 24), ChromeMargins::default()).unwrap();
        assert_eq!(
            layout.outer,
            Area {
                x: 0,
                y: 4,
                width: 80,
                height: 19
            }
        );
    }

    #[tokio::test]
    async fn test_hit_maps_controls_and_taskbar() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let view = view_of(&desktop);

        let layout = window_layout(&view.windows[0], view.bounds, view.chrome).unwrap();
        let (control, area) = layout.controls[1];
        assert_eq!(
            hit(&view, Point::new(area.x + 1, area.y)),
            Some(DesktopEvent::ControlPressed {
                window: id.clone(),
                name: control.name().to_string()
            })
        );

        // Body presses are plain pointer presses
        assert_eq!(hit(&view, Point::new(layout.body.x + 2, layout.body.y + 1)), None);

        let (key, _, label) = taskbar_layout(&view.taskbar, view.chrome).pop().unwrap();
        assert_eq!(key, "notepad");
        assert_eq!(
            hit(&view, Point::new(label.x, label.y)),
            Some(DesktopEvent::TaskbarActivated { key })
        );
    }

    #[tokio::test]
    async fn test_hit_maps_dialog_buttons() {
        let desktop = desktop();
        let (window, _reply) = Dialog::new("Continue?")
            .buttons(DialogButtons::OkCancel)
            .into_window(desktop.settings(), desktop.screen_bounds());
        let id = desktop.mount(window).unwrap().window;
        let view = view_of(&desktop);

        let layout = window_layout(&view.windows[0], view.bounds, view.chrome).unwrap();
        let (label, area) = layout.actions[1].clone();
        assert_eq!(label, "Cancel");
        assert_eq!(
            hit(&view, Point::new(area.x, area.y)),
            Some(DesktopEvent::ControlPressed { window: id, name: label })
        );
    }

    #[tokio::test]
    async fn test_draw_shows_windows_and_taskbar() {
        let desktop = desktop();
        mount_titled(&desktop, "Notepad");
        let view = view_of(&desktop);

        let mut terminal = Terminal::new(TestBackend::new(211, 53)).unwrap();
        terminal.draw(|f| draw(f, &view)).unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("termdesk"));
        assert!(text.contains(" Desktop | Notepad "));
        assert!(text.contains(" Notepad "));
        assert!(text.contains("ready"));
    }
}
