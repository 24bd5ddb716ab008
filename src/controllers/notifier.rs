use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// User-visible notification raised by a controller action
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
    pub timestamp: i64,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

/// Fan-out of notifications to every UI subscriber
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.tx.receiver_count())
            .finish()
    }
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn success(&self, title: &str, description: impl Into<String>) {
        self.send(title, description.into(), NotificationVariant::Default);
    }

    pub fn error(&self, title: &str, description: impl Into<String>) {
        self.send(title, description.into(), NotificationVariant::Destructive);
    }

    fn send(&self, title: &str, description: String, variant: NotificationVariant) {
        match variant {
            NotificationVariant::Default => info!("{}: {}", title, description),
            NotificationVariant::Destructive => warn!("{}: {}", title, description),
        }

        // No subscribers is fine
        let _ = self.tx.send(Notification {
            title: title.to_string(),
            description,
            variant,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
