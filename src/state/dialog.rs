use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::window::{ContentAction, TitleBarControls, Window, WindowConfig, WindowContent};
use super::DesktopSettings;
use crate::input_handler::{ScreenBounds, Size};

const MIN_WIDTH: i32 = 35;
const TEXT_MARGIN: i32 = 35;
const HEIGHT: i32 = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogButtons {
    Ok,
    YesNo,
    OkCancel,
    YesNoCancel,
    AbortRetryIgnore,
    RetryCancel,
}

impl DialogButtons {
    pub fn labels(&self) -> &'static [&'static str] {
        match self {
            DialogButtons::Ok => &["Ok"],
            DialogButtons::YesNo => &["Yes", "No"],
            DialogButtons::OkCancel => &["Ok", "Cancel"],
            DialogButtons::YesNoCancel => &["Yes", "No", "Cancel"],
            DialogButtons::AbortRetryIgnore => &["Abort", "Retry", "Ignore"],
            DialogButtons::RetryCancel => &["Retry", "Cancel"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogIcon {
    Info,
    Question,
    Exclamation,
    Critical,
}

impl DialogIcon {
    pub fn glyph(&self) -> &'static str {
        match self {
            DialogIcon::Info => "(i)",
            DialogIcon::Question => "(?)",
            DialogIcon::Exclamation => "(!)",
            DialogIcon::Critical => "(x)",
        }
    }
}

/// A message box. Built into an ordinary `Window` whose content reports the
/// button that was pressed.
#[derive(Debug, Clone)]
pub struct Dialog {
    message: String,
    title: String,
    buttons: DialogButtons,
    icon: DialogIcon,
}

impl Dialog {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            title: "Message".to_string(),
            buttons: DialogButtons::Ok,
            icon: DialogIcon::Info,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn buttons(mut self, buttons: DialogButtons) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn icon(mut self, icon: DialogIcon) -> Self {
        self.icon = icon;
        self
    }

    /// Width grows with the message so it fits on one line
    pub fn size(&self) -> Size {
        let text = self.message.chars().count() as i32;
        Size::new(MIN_WIDTH.max(text + TEXT_MARGIN), HEIGHT)
    }

    pub fn into_window(self, settings: &DesktopSettings, screen: ScreenBounds) -> (Window, DialogReply) {
        let (tx, rx) = oneshot::channel();
        let config = WindowConfig {
            title: self.title.clone(),
            size: Some(self.size()),
            controls: TitleBarControls {
                close: true,
                minimize: true,
                maximize: false,
            },
            ..Default::default()
        };

        let content = DialogContent {
            message: self.message,
            icon: self.icon,
            buttons: self.buttons,
            reply: Some(tx),
        };

        let window = Window::new(config, content, settings.default_window, screen);
        (window, DialogReply(rx))
    }
}

struct DialogContent {
    message: String,
    icon: DialogIcon,
    buttons: DialogButtons,
    reply: Option<oneshot::Sender<Option<String>>>,
}

impl WindowContent for DialogContent {
    fn lines(&self) -> Vec<String> {
        vec![String::new(), format!("{}  {}", self.icon.glyph(), self.message)]
    }

    fn actions(&self) -> Vec<String> {
        self.buttons.labels().iter().map(|s| s.to_string()).collect()
    }

    fn on_action(&mut self, name: &str) -> ContentAction {
        if !self.buttons.labels().iter().any(|label| *label == name) {
            return ContentAction::Ignore;
        }
        if let Some(reply) = self.reply.take() {
            // The receiver may already be gone; the choice is still final
            let _ = reply.send(Some(name.to_string()));
        }
        ContentAction::Close
    }
}

/// Resolves once the dialog is answered or closed
#[derive(Debug)]
pub struct DialogReply(oneshot::Receiver<Option<String>>);

impl DialogReply {
    /// The pressed button label, or None if the window was closed without one
    pub async fn chosen(self) -> Option<String> {
        self.0.await.ok().flatten()
    }
}
