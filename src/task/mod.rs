// Orchestration core — registration model, staging, argument assembly,
// result loading, and the session that ties them together.

pub mod load;
pub mod session;
pub mod stage;
pub mod types;

pub use session::ContainerTask;
pub use types::{LoadEntry, RunArgs, SaveEntry};
