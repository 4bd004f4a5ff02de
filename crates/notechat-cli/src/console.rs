//! Alert surface that prints to stdout as JSONL.

use notechat_realtime::{NotificationOptions, NotificationSurface};

use crate::events::{emit, EventAlert};

pub struct ConsoleSurface {
    pub allow: bool,
}

#[async_trait::async_trait]
impl NotificationSurface for ConsoleSurface {
    async fn request_permission(&self) -> bool {
        self.allow
    }

    async fn send(&self, title: &str, options: NotificationOptions) -> Result<(), String> {
        emit(&EventAlert::new(title, &options.body, &options.tag));
        Ok(())
    }
}
