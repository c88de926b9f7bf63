use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::{Error, Result};

use super::run::invoke;
use super::types::{CancelToken, ContainerCommand};

/// Verify that the container engine is installed and its daemon reachable.
///
/// Runs a bare `<engine> ps` and inspects only the exit code; output is
/// discarded.
pub fn ensure_available(engine: &str) -> Result<()> {
    let status = Command::new(engine)
        .arg("ps")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| Error::RuntimeUnavailable(engine.to_string()))?;

    if !status.success() {
        return Err(Error::RuntimeUnavailable(engine.to_string()));
    }
    Ok(())
}

/// Returns `["--user", "uid:gid"]` on Unix so containers write files
/// as the invoking user. Empty on other platforms.
pub fn user_args() -> Vec<String> {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() and getegid() are simple POSIX getters that always succeed and have no side effects.
        let uid = unsafe { libc::geteuid() };
        let gid = unsafe { libc::getegid() };
        vec!["--user".into(), format!("{uid}:{gid}")]
    }

    #[cfg(not(unix))]
    {
        Vec::new()
    }
}

/// Run one engine subcommand to completion, mapping every unclean outcome
/// onto the session error taxonomy.
pub fn execute(
    engine: &str,
    subcommand: &str,
    args: Vec<String>,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> Result<()> {
    let mut full_args = Vec::with_capacity(args.len() + 1);
    full_args.push(subcommand.to_string());
    full_args.extend(args);

    let mut cmd = ContainerCommand::new(engine, full_args);
    cmd.timeout = timeout;

    let result = invoke(&cmd, cancel)?;
    if result.cancelled {
        return Err(Error::Cancelled {
            command: subcommand.to_string(),
        });
    }
    if result.timed_out {
        return Err(Error::TimedOut {
            command: subcommand.to_string(),
            seconds: timeout.map(|t| t.as_secs()).unwrap_or(0),
        });
    }
    if !result.success() {
        log::warn!(
            "`{engine} {subcommand}` failed:\n{}",
            result.log.trim_end()
        );
        return Err(Error::ExecutionFailed {
            command: subcommand.to_string(),
            // Signal deaths have no exit code; keep them distinguishable.
            code: result.exit_code.unwrap_or(-1),
        });
    }
    Ok(())
}

/// Force-remove an image (`rmi -f <image>`), non-interactive.
pub fn remove_image(
    engine: &str,
    image: &str,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> Result<()> {
    let args = vec!["-f".to_string(), image.to_string()];
    execute(engine, "rmi", args, timeout, cancel)
}
