use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cooperative cancellation token backed by an `AtomicBool`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One engine subcommand invocation, e.g. `docker run ...` or `docker rmi ...`.
///
/// `args` starts with the subcommand itself; the assembling layer owns the
/// full argument order.
#[derive(Debug, Clone)]
pub struct ContainerCommand {
    /// Engine binary (`docker`, `podman`, an absolute path to a stub, ...).
    pub engine: String,
    pub args: Vec<String>,
    /// `None` waits without bound.
    pub timeout: Option<Duration>,
}

impl ContainerCommand {
    pub fn new(engine: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            engine: engine.into(),
            args,
            timeout: None,
        }
    }

    /// The subcommand (`run`, `rmi`, `ps`), for diagnostics.
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }
}

/// Outcome of one subcommand invocation.
#[derive(Debug)]
pub struct ContainerResult {
    /// `None` when the child was killed (timeout/cancel) or died to a signal.
    pub exit_code: Option<i32>,
    /// Interleaved stdout/stderr transcript.
    pub log: String,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl ContainerResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out && !self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_starts_uncancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_token_is_visible_across_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
        // Idempotent.
        b.cancel();
        assert!(a.is_cancelled());
    }

    #[test]
    fn subcommand_is_first_argument() {
        let cmd = ContainerCommand::new("docker", vec!["run".into(), "--rm".into()]);
        assert_eq!(cmd.subcommand(), "run");
        assert_eq!(ContainerCommand::new("docker", vec![]).subcommand(), "");
    }

    #[test]
    fn success_requires_clean_zero_exit() {
        let ok = ContainerResult {
            exit_code: Some(0),
            log: String::new(),
            timed_out: false,
            cancelled: false,
        };
        assert!(ok.success());

        let timed_out = ContainerResult {
            exit_code: Some(0),
            log: String::new(),
            timed_out: true,
            cancelled: false,
        };
        assert!(!timed_out.success());

        let nonzero = ContainerResult {
            exit_code: Some(2),
            log: String::new(),
            timed_out: false,
            cancelled: false,
        };
        assert!(!nonzero.success());
    }
}
