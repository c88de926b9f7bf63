use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort an orchestration session.
///
/// Missing *outputs* are deliberately absent: a containerized tool may skip
/// conditional artifacts, so those are logged and tolerated instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid registration: duplicate argument flag or malformed entry.
    /// Raised synchronously at registration time, never at run time.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The container engine is not installed or its daemon is unreachable.
    #[error("container engine `{0}` is not available")]
    RuntimeUnavailable(String),

    /// A subcommand of the engine exited with a nonzero code.
    /// `code` is negative when the child was terminated by a signal.
    #[error("container command `{command}` failed with exit code {code}")]
    ExecutionFailed { command: String, code: i32 },

    /// The engine subprocess outlived the configured timeout and was killed.
    #[error("container command `{command}` timed out after {seconds}s")]
    TimedOut { command: String, seconds: u64 },

    /// The caller cancelled the session while the subprocess was running.
    #[error("container command `{command}` was cancelled")]
    Cancelled { command: String },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The save/load collaborator rejected a file.
    #[error("codec failed for {path}: {source}")]
    Codec {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The directory provider could not allocate or release a directory.
    #[error("directory provisioning failed: {0}")]
    Provision(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn codec(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Error::Codec {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
