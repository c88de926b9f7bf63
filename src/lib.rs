//! Staging data in and out of containerized command-line tools.
//!
//! A [`ContainerTask`] owns one working directory that doubles as the
//! container-side mount point, stages registered inputs there (or mounts
//! data already on disk read-only), assembles the engine/application
//! argument vectors, runs the image, and loads produced artifacts back
//! through a host-supplied [`Codec`].

pub mod config;
pub mod data;
pub mod docker;
pub mod error;
pub mod paths;
pub mod task;
pub mod workdir;

pub use config::Config;
pub use data::Codec;
pub use docker::CancelToken;
pub use error::{Error, Result};
pub use task::ContainerTask;
