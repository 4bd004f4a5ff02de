/// Realtime ingress: change events in, transcript appends and alerts out.
///
/// Pure decision (`decision`) → effects (`effect`) → `executor`, driven by
/// a single event loop that owns the subscription.
pub mod decision;
pub mod effect;
pub mod event;
pub(crate) mod executor;
pub mod handler;
pub mod lookup;
pub(crate) mod r#loop;

pub use decision::{is_self_echo, plan, DecisionContext, ResolvedNames};
pub use effect::IngressEffect;
pub use event::InboundMessage;
pub use handler::{IngressHandler, IngressOutcome};
pub use lookup::NameResolver;
