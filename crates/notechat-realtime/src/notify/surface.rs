/// Options passed alongside a notification title.
///
/// `tag` collapses earlier undelivered alerts that share it
/// (replace semantics are up to the surface).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOptions {
    pub body: String,
    pub tag: String,
}

/// Abstraction over the platform alert mechanism.
///
/// In production: impl over the OS / browser notification API.
/// In tests and the demo: [`RecordingSurface`](crate::memory::RecordingSurface).
#[async_trait::async_trait]
pub trait NotificationSurface: Send + Sync + 'static {
    /// Ask the user for permission to show alerts.
    async fn request_permission(&self) -> bool;

    /// Show one alert.
    async fn send(&self, title: &str, options: NotificationOptions) -> Result<(), String>;
}
