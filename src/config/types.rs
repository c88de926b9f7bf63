use serde::{Deserialize, Serialize};

/// Session defaults. Every field has a default so a partial config file
/// (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container engine binary, resolved via `PATH` (or an absolute path).
    pub engine: String,

    /// Per-subcommand timeout in seconds. `0` waits without bound.
    pub timeout: u64,

    /// Pass `--rm` so the container is removed after the run.
    pub auto_remove_container: bool,

    /// Force-remove the image (`rmi -f`) once results are collected.
    pub auto_remove_image: bool,

    /// GPU request passed as `--gpus <value>`, e.g. `"all"` or `"device=0"`.
    pub gpus: Option<String>,

    /// Run the container as the invoking user (`--user uid:gid`, Unix only)
    /// so files written into the working directory are owned by the caller.
    pub run_as_user: bool,

    /// Extra `run` arguments as one shell-style string, e.g. `"--ipc=host"`.
    pub extra_run_args: String,

    /// Leave the working directory on disk after the session ends.
    pub keep_working_dir: bool,
}

impl Config {
    /// Split [`extra_run_args`](Config::extra_run_args) into tokens.
    pub fn split_extra_run_args(&self) -> anyhow::Result<Vec<String>> {
        if self.extra_run_args.trim().is_empty() {
            return Ok(Vec::new());
        }
        shell_words::split(&self.extra_run_args)
            .map_err(|e| anyhow::anyhow!("malformed extra_run_args: {e}"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: "docker".to_string(),
            timeout: 0,
            auto_remove_container: false,
            auto_remove_image: false,
            gpus: None,
            run_as_user: false,
            extra_run_args: String::new(),
            keep_working_dir: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_docker_with_unbounded_wait() {
        let cfg = Config::default();
        assert_eq!(cfg.engine, "docker");
        assert_eq!(cfg.timeout, 0);
        assert!(!cfg.auto_remove_container);
        assert!(!cfg.auto_remove_image);
        assert!(cfg.gpus.is_none());
    }

    #[test]
    fn extra_run_args_split_like_a_shell() {
        let cfg = Config {
            extra_run_args: "--ipc=host --shm-size \"2 g\"".into(),
            ..Config::default()
        };
        assert_eq!(
            cfg.split_extra_run_args().unwrap(),
            vec!["--ipc=host", "--shm-size", "2 g"]
        );
    }

    #[test]
    fn empty_extra_run_args_yield_no_tokens() {
        assert!(Config::default().split_extra_run_args().unwrap().is_empty());
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let cfg = Config {
            extra_run_args: "--label \"broken".into(),
            ..Config::default()
        };
        assert!(cfg.split_extra_run_args().is_err());
    }
}
