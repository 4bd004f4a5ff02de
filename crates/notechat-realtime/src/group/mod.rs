/// Group metadata: membership, join requests, the local directory.
///
/// Pure state; persistence goes through the client.
pub mod directory;
pub mod types;

pub use directory::GroupDirectory;
pub use types::{Group, JoinOutcome};
