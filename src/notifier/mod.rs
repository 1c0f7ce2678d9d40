pub mod desktop;
pub mod dialog;

use async_trait::async_trait;
use futures::future;

#[async_trait]
pub trait Notifier {
    /// Delivers an alert. Blocking notifiers resolve once the user has seen it.
    async fn notify(&self, title: &str, body: &str);
}

pub type DynNotifier = dyn Notifier + Send + Sync;

pub struct CompositeNotifier {
    notifiers: Vec<Box<DynNotifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Box<DynNotifier>>) -> Self {
        Self { notifiers }
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn notify(&self, title: &str, body: &str) {
        future::join_all(self.notifiers.iter().map(|x| x.notify(title, body))).await;
    }
}

pub use desktop::DesktopNotifier;
pub use dialog::DialogNotifier;
