/// Notification pipeline: alert formatting, routing and the surface seam.
pub mod intent;
pub mod router;
pub mod surface;

pub use intent::{preview, NotificationIntent, NotificationKind};
pub use router::NotificationRouter;
pub use surface::{NotificationOptions, NotificationSurface};
