// Single dispatch entry point for desktop input

use tracing::debug;

use super::types::{Control, DesktopEvent};
use crate::error::DesktopError;
use crate::state::taskbar::Taskbar;
use crate::state::window::ContentAction;
use crate::state::Desktop;

impl Desktop {
    /// Route one input event. Events must be delivered in arrival order from a
    /// single thread; transitions they start run in the background.
    pub fn handle_event(&self, event: DesktopEvent) -> Result<(), DesktopError> {
        match event {
            DesktopEvent::PointerDown { at } => {
                let Some(id) = self.window_at(at) else {
                    return Ok(());
                };
                self.select(&id)?;
                self.begin_drag(&id, at)?;
                Ok(())
            }
            DesktopEvent::PointerMove { at, delta } => {
                let Some(id) = self.dragging() else {
                    return Ok(());
                };
                self.drag_update(&id, at, delta)?;
                Ok(())
            }
            DesktopEvent::PointerUp { .. } => {
                self.end_drag();
                Ok(())
            }
            DesktopEvent::ControlPressed { window, name } => self.press(&window, &name),
            DesktopEvent::TaskbarActivated { key } => self.activate_entry(&key),
        }
    }

    fn press(&self, id: &str, name: &str) -> Result<(), DesktopError> {
        let Some(control) = Control::from_name(name) else {
            // Not a title bar control: the window content decides
            let action = {
                let mut state = self.lock();
                state.window_mut(id)?.content.on_action(name)
            };
            if action == ContentAction::Close {
                self.close(id)?;
            }
            return Ok(());
        };

        let allowed = {
            let state = self.lock();
            state.window(id)?.controls.allows(control)
        };
        if !allowed {
            debug!(window = %id, control = control.name(), "Disabled control ignored");
            return Ok(());
        }

        match control {
            Control::Close => {
                self.close(id)?;
            }
            Control::Minimize => {
                self.minimize(id)?;
            }
            Control::Maximize => {
                self.maximize(id)?;
            }
        }
        Ok(())
    }

    fn activate_entry(&self, key: &str) -> Result<(), DesktopError> {
        if Taskbar::is_desktop_key(key) {
            self.lock().clear_selection();
            return Ok(());
        }

        let window = self.lock().taskbar.entry(key).and_then(|e| e.window.clone());
        match window {
            Some(id) => self.select(&id),
            None => Ok(()),
        }
    }
}
