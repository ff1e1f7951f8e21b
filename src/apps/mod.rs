// Applications compiled into the shell

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::error::ProcessError;
use crate::process::{AppContext, AppError, Application, EntryPoint, ProcessId, ProcessManager};
use crate::state::dialog::{Dialog, DialogButtons, DialogIcon};
use crate::state::window::{TextContent, WindowConfig};

/// Greets the user: a text window plus a question dialog.
///
/// Arguments: `[title, user]`, both optional.
pub struct Welcome;

#[async_trait]
impl Application for Welcome {
    async fn main(&self, ctx: AppContext) -> Result<(), AppError> {
        let title = ctx.args.first().cloned().unwrap_or_else(|| "Welcome".to_string());
        let user = ctx.args.get(1).map(String::as_str).unwrap_or("guest");
        let desktop = &ctx.desktop;

        let window = desktop.create_window(
            WindowConfig::titled(title.clone()),
            TextContent::new([
                format!("Hello, {}.", user),
                String::new(),
                "Drag a window by pressing inside it.".to_string(),
                "Title bar: X close, O minimize, █ maximize.".to_string(),
                format!("This window belongs to process {}.", ctx.pid),
            ]),
        );
        let handle = desktop.mount(window)?;
        desktop.select(&handle.window)?;

        let (dialog, reply) = Dialog::new("Is this your first visit?")
            .title(format!("{} - Question", title))
            .icon(DialogIcon::Question)
            .buttons(DialogButtons::YesNo)
            .into_window(desktop.settings(), desktop.screen_bounds());
        let dialog = desktop.mount(dialog)?;
        desktop.select(&dialog.window)?;

        match reply.chosen().await {
            Some(answer) => info!(pid = ctx.pid, answer = %answer, "Welcome dialog answered"),
            None => info!(pid = ctx.pid, "Welcome dialog dismissed"),
        }
        Ok(())
    }
}

/// Start a `Welcome` process whose window is titled `title`
pub fn launch_welcome(processes: &ProcessManager, title: &str, user: &str) -> Result<ProcessId, ProcessError> {
    processes.launch(
        "Welcome",
        EntryPoint::Builtin(Arc::new(Welcome)),
        vec![title.to_string(), user.to_string()],
    )
}
