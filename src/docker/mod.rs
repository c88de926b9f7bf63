// Container engine plumbing — availability probe, subprocess invocation,
// timeout and cancellation.

pub mod engine;
pub mod run;
pub mod types;

pub use engine::{ensure_available, execute, remove_image, user_args};
pub use run::invoke;
pub use types::{CancelToken, ContainerCommand, ContainerResult};
