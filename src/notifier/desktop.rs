use core::time::Duration;

use async_trait::async_trait;
use notify_rust::{Notification, Timeout};

use crate::notifier::Notifier;

const BANNER_TIMEOUT: Duration = Duration::from_secs(20);

/// Notification banner through the desktop's notification service.
pub struct DesktopNotifier {
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            timeout: BANNER_TIMEOUT,
        }
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, title: &str, body: &str) {
        let mut notification = Notification::new();
        notification
            .appname(env!("CARGO_PKG_NAME"))
            .summary(title)
            .body(body)
            .timeout(Timeout::from(self.timeout));

        // Showing a notification is a blocking D-Bus round trip on Linux.
        match tokio::task::spawn_blocking(move || notification.show().map(drop)).await {
            Ok(Ok(())) => log::debug!("Desktop notification shown"),
            Ok(Err(e)) => log::error!("Failed to show desktop notification: {}", e),
            Err(e) => log::error!("Desktop notification task failed: {}", e),
        }
    }
}
