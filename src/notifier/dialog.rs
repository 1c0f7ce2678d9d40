use async_trait::async_trait;
use tokio::process::Command;

use crate::notifier::Notifier;

/// A modal dialog; `notify` resolves once the user dismisses it.
pub struct DialogNotifier;

impl DialogNotifier {
    pub fn new() -> Self {
        Self
    }

    #[cfg(target_os = "macos")]
    fn command(title: &str, body: &str) -> Command {
        let script = format!(
            "display dialog \"{}\" with title \"{}\" buttons {{\"OK\"}} default button \"OK\"",
            escape_applescript(body),
            escape_applescript(title),
        );

        let mut command = Command::new("osascript");
        command.arg("-e").arg(script);
        command
    }

    #[cfg(not(target_os = "macos"))]
    fn command(title: &str, body: &str) -> Command {
        let mut command = Command::new("zenity");
        command
            .arg("--info")
            .arg("--no-markup")
            .arg(format!("--title={title}"))
            .arg(format!("--text={body}"));
        command
    }
}

#[async_trait]
impl Notifier for DialogNotifier {
    async fn notify(&self, title: &str, body: &str) {
        match Self::command(title, body).kill_on_drop(true).status().await {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("Alert dialog exited with {}", status),
            Err(e) => log::error!("Failed to show alert dialog: {}", e),
        }
    }
}

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
