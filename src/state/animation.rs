//! Timed window transitions
//!
//! Every transition holds the window's busy guard from request to completion,
//! so at most one animation writes a window's geometry and drags are ignored
//! meanwhile. The discrete state flips only when the last step has landed.

use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::window::{BusyGuard, WindowId, WindowState};
use super::Desktop;
use crate::error::DesktopError;
use crate::input_handler::spatial::{interpolate, maximized_size};
use crate::input_handler::{Frame, Point, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    Restore,
    Minimize,
    Maximize,
    Delete,
}

/// Handle to a running transition
#[derive(Debug)]
pub struct TaskHandle {
    window: WindowId,
    transition: Transition,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn window(&self) -> &str {
        &self.window
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the transition to land
    pub async fn finished(self) -> Result<(), DesktopError> {
        self.join
            .await
            .map_err(|_| DesktopError::AnimationAborted(self.window))
    }
}

impl Desktop {
    /// Animate back to the stored size and position
    pub fn restore(&self, id: &str) -> Result<Option<TaskHandle>, DesktopError> {
        let (guard, target) = {
            let mut state = self.lock();
            let window = state.window_mut(id)?;
            if window.state == WindowState::Normal {
                return Ok(None);
            }
            let guard = self.acquire(&window.busy, id)?;
            let target = window.home;

            end_drag_on(&mut state.drag, id);
            (guard, target)
        };

        Ok(Some(self.spawn_timed_transition(
            id,
            Transition::Restore,
            target,
            self.settings.animation_duration(),
            guard,
        )))
    }

    /// Shrink into the screen origin. A maximized window goes there directly
    /// and comes back to its normal geometry when restored.
    pub fn minimize(&self, id: &str) -> Result<Option<TaskHandle>, DesktopError> {
        let guard = {
            let mut state = self.lock();
            let window = state.window_mut(id)?;
            if window.state == WindowState::Minimized {
                return Ok(None);
            }
            let guard = self.acquire(&window.busy, id)?;
            window.primary = false;

            if state.selected.as_deref() == Some(id) {
                state.clear_selection();
            }
            end_drag_on(&mut state.drag, id);
            guard
        };

        Ok(Some(self.spawn_timed_transition(
            id,
            Transition::Minimize,
            Frame::new(Point::ORIGIN, Size::ZERO),
            self.settings.animation_duration(),
            guard,
        )))
    }

    /// Grow to fill the screen between the chrome margins.
    /// Maximizing a maximized window restores it.
    pub fn maximize(&self, id: &str) -> Result<Option<TaskHandle>, DesktopError> {
        let (guard, has_title_bar) = {
            let mut state = self.lock();
            let window = state.window_mut(id)?;
            if window.state == WindowState::Maximized {
                drop(state);
                return self.restore(id);
            }
            let guard = self.acquire(&window.busy, id)?;
            let has_title_bar = window.has_title_bar;

            end_drag_on(&mut state.drag, id);
            (guard, has_title_bar)
        };

        let size = maximized_size(self.screen_bounds(), self.settings.chrome, has_title_bar);
        Ok(Some(self.spawn_timed_transition(
            id,
            Transition::Maximize,
            Frame::new(Point::ORIGIN, size),
            self.settings.animation_duration(),
            guard,
        )))
    }

    /// Shrink into the window's center, then remove it from the desktop
    pub fn close(&self, id: &str) -> Result<TaskHandle, DesktopError> {
        let (guard, target) = {
            let mut state = self.lock();
            let window = state.window_mut(id)?;
            let guard = self.acquire(&window.busy, id)?;
            window.state = WindowState::ClosingAnimating;
            window.primary = false;
            let target = Frame::new(window.frame.center(), Size::ZERO);

            end_drag_on(&mut state.drag, id);
            (guard, target)
        };

        info!(window = %id, "Deleting window");
        Ok(self.spawn_timed_transition(
            id,
            Transition::Delete,
            target,
            self.settings.animation_duration(),
            guard,
        ))
    }

    fn acquire(
        &self,
        flag: &std::sync::Arc<std::sync::atomic::AtomicBool>,
        id: &str,
    ) -> Result<BusyGuard, DesktopError> {
        BusyGuard::try_acquire(flag).ok_or_else(|| {
            warn!(window = %id, "Transition requested while busy, dropped");
            DesktopError::AnimationBusy(id.to_string())
        })
    }

    /// Step the window's live frame towards `target` in the background
    fn spawn_timed_transition(
        &self,
        id: &str,
        transition: Transition,
        target: Frame,
        duration: Duration,
        guard: BusyGuard,
    ) -> TaskHandle {
        let desktop = self.clone();
        let window = id.to_string();
        let interval = self.settings.frame_interval();
        let steps = step_count(duration, interval);

        debug!(window = %id, ?transition, steps, "Starting transition");

        let join = self.runtime.spawn({
            let window = window.clone();
            async move {
                let Some(start) = desktop.frame_of(&window) else {
                    return;
                };

                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately
                ticker.tick().await;

                for step in 1..=steps {
                    ticker.tick().await;
                    let progress = f64::from(step) / f64::from(steps);

                    let mut state = desktop.lock();
                    let Some(w) = state.windows.get_mut(&window) else {
                        // Removed from under us
                        return;
                    };
                    w.frame = interpolate(&start, &target, progress);
                }

                desktop.finish_transition(&window, transition, target, guard);
            }
        });

        TaskHandle {
            window,
            transition,
            join,
        }
    }

    fn finish_transition(&self, id: &str, transition: Transition, target: Frame, guard: BusyGuard) {
        if transition == Transition::Delete {
            let removed = self.remove(id);
            // Released only once the window is gone
            drop(guard);
            if let Err(e) = removed {
                debug!(window = %id, error = %e, "Window already gone after delete animation");
            }
            return;
        }

        let mut state = self.lock();
        if let Some(window) = state.windows.get_mut(id) {
            window.frame = target;
            window.state = match transition {
                Transition::Restore => WindowState::Normal,
                Transition::Minimize => WindowState::Minimized,
                Transition::Maximize => WindowState::Maximized,
                Transition::Delete => WindowState::ClosingAnimating,
            };
            debug!(window = %id, state = %window.state, "Transition finished");

            // A select that raced the shrink must not leave a minimized window focused
            if transition == Transition::Minimize {
                window.primary = false;
                if state.selected.as_deref() == Some(id) {
                    state.clear_selection();
                }
            }
        }
        // Busy clears together with the state flip
        drop(guard);
    }
}

/// Number of frames in a transition, at least one
fn step_count(duration: Duration, interval: Duration) -> u32 {
    let steps = duration.as_millis() / interval.as_millis().max(1);
    u32::try_from(steps).unwrap_or(u32::MAX).max(1)
}

fn end_drag_on(drag: &mut Option<WindowId>, id: &str) {
    if drag.as_deref() == Some(id) {
        *drag = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input_handler::Point;
    use crate::state::tests::{desktop, mount_titled};

    #[tokio::test(start_paused = true)]
    async fn test_minimize_then_restore() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        desktop.select(&id).unwrap();
        let home = desktop.window(&id).unwrap().home;

        let handle = desktop.minimize(&id).unwrap().expect("animation spawned");
        assert_eq!(handle.transition(), Transition::Minimize);
        assert!(desktop.window(&id).unwrap().busy);
        // Selection is dropped as soon as the window starts shrinking
        assert!(desktop.selected().is_none());
        assert!(desktop.taskbar().active().is_none());

        handle.finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Minimized);
        assert_eq!(w.frame, Frame::new(Point::ORIGIN, Size::ZERO));
        assert_eq!(w.home, home);
        assert!(!w.busy);

        let handle = desktop.restore(&id).unwrap().expect("animation spawned");
        handle.finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Normal);
        assert_eq!(w.frame, home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimize_when_minimized_is_noop() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        desktop.minimize(&id).unwrap().unwrap().finished().await.unwrap();

        assert!(desktop.minimize(&id).unwrap().is_none());
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Minimized);
        assert!(!w.busy);

        // Likewise restoring a normal window
        let other = mount_titled(&desktop, "Other");
        assert!(desktop.restore(&other).unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_request_while_busy_is_rejected() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");

        let handle = desktop.maximize(&id).unwrap().unwrap();
        assert_eq!(
            desktop.minimize(&id).unwrap_err(),
            DesktopError::AnimationBusy(id.clone())
        );
        assert_eq!(
            desktop.close(&id).unwrap_err(),
            DesktopError::AnimationBusy(id.clone())
        );

        handle.finished().await.unwrap();
        assert_eq!(desktop.window(&id).unwrap().state, WindowState::Maximized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_maximize_fills_screen_and_toggles_back() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let home = desktop.window(&id).unwrap().home;

        desktop.maximize(&id).unwrap().unwrap().finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Maximized);
        assert_eq!(w.frame, Frame::new(Point::ORIGIN, Size::new(211, 48)));

        // Maximized hit box ignores the stored geometry
        assert!(desktop.hit_test(&id, Point::new(0, 10)).unwrap());
        assert!(!desktop.hit_test(&id, Point::new(0, 2)).unwrap());

        let handle = desktop.maximize(&id).unwrap().unwrap();
        assert_eq!(handle.transition(), Transition::Restore);
        handle.finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Normal);
        assert_eq!(w.frame, home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_minimize_from_maximized_restores_to_normal() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let home = desktop.window(&id).unwrap().home;

        desktop.maximize(&id).unwrap().unwrap().finished().await.unwrap();
        desktop.minimize(&id).unwrap().unwrap().finished().await.unwrap();
        assert_eq!(desktop.window(&id).unwrap().state, WindowState::Minimized);

        desktop.restore(&id).unwrap().unwrap().finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Normal);
        assert_eq!(w.frame, home);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_removes_window_after_animation() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        desktop.select(&id).unwrap();

        let handle = desktop.close(&id).unwrap();
        assert_eq!(
            desktop.window(&id).unwrap().state,
            WindowState::ClosingAnimating
        );
        // Still listed until the animation lands
        assert!(desktop.taskbar().key_for(&id).is_some());

        handle.finished().await.unwrap();
        assert!(desktop.window(&id).is_none());
        assert!(desktop.taskbar().key_for(&id).is_none());
        assert!(desktop.taskbar().active().is_none());
        assert!(desktop.remove(&id).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_progress_linearly() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let start = desktop.window(&id).unwrap().frame;

        let handle = desktop.minimize(&id).unwrap().unwrap();

        // Halfway through: 5 of 10 steps at 33ms
        tokio::time::sleep(Duration::from_millis(5 * 33 + 1)).await;
        let mid = desktop.window(&id).unwrap().frame;
        assert!(mid.size.width < start.size.width);
        assert!(mid.size.width > 0);
        assert_eq!(desktop.window(&id).unwrap().state, WindowState::Normal);

        handle.finished().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_drag_ignored_while_animating() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let grip = desktop.window(&id).unwrap().home.position;

        assert!(desktop.begin_drag(&id, grip).unwrap());
        let handle = desktop.maximize(&id).unwrap().unwrap();

        // Animation ended the drag and blocks new ones
        assert!(desktop.dragging().is_none());
        assert!(!desktop.begin_drag(&id, Point::new(10, 10)).unwrap());
        assert!(!desktop.drag_update(&id, grip, Point::new(1, 1)).unwrap());

        handle.finished().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_restores_minimized_window() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        desktop.minimize(&id).unwrap().unwrap().finished().await.unwrap();

        desktop.select(&id).unwrap();
        assert_eq!(desktop.selected(), Some(id.clone()));
        assert!(desktop.window(&id).unwrap().busy);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(desktop.window(&id).unwrap().state, WindowState::Normal);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_during_minimize_leaves_nothing_focused() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        desktop.select(&id).unwrap();

        let handle = desktop.minimize(&id).unwrap().unwrap();
        // Still Normal mid-shrink, so the select takes focus
        desktop.select(&id).unwrap();
        assert_eq!(desktop.selected(), Some(id.clone()));

        handle.finished().await.unwrap();
        let w = desktop.window(&id).unwrap();
        assert_eq!(w.state, WindowState::Minimized);
        assert!(!w.primary);
        assert!(desktop.selected().is_none());
        assert!(desktop.taskbar().active().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_releases_busy_after_removal() {
        let desktop = desktop();
        let id = mount_titled(&desktop, "Notepad");
        let flag = desktop.lock().window(&id).unwrap().busy.clone();

        desktop.close(&id).unwrap().finished().await.unwrap();
        assert!(desktop.window(&id).is_none());
        assert!(!flag.load(std::sync::atomic::Ordering::Acquire));
    }

    #[test]
    fn test_step_count_saturates() {
        let interval = Duration::from_millis(33);
        assert_eq!(step_count(Duration::from_millis(333), interval), 10);
        assert_eq!(step_count(Duration::ZERO, interval), 1);
        assert_eq!(step_count(Duration::from_millis(u64::MAX), Duration::from_millis(1)), u32::MAX);
        assert_eq!(step_count(Duration::from_millis(100), Duration::ZERO), 100);
    }
}
