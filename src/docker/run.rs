use std::io::BufRead;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

use super::types::{CancelToken, ContainerCommand, ContainerResult};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Invoke one engine subcommand and wait for it to finish.
///
/// Both output pipes are drained line by line (logged at debug level) into
/// the returned transcript. The child is killed when the timeout elapses or
/// the token is cancelled; interpreting the outcome is the caller's job.
pub fn invoke(cmd: &ContainerCommand, cancel: &CancelToken) -> Result<ContainerResult> {
    log::debug!("invoking `{} {}`", cmd.engine, cmd.args.join(" "));

    let mut child = Command::new(&cmd.engine)
        .args(&cmd.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|_| Error::RuntimeUnavailable(cmd.engine.clone()))?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    // Transcript shared with the reader threads.
    let log_buf = Arc::new(Mutex::new(String::new()));
    let stdout_handle = spawn_reader(stdout, log_buf.clone());
    let stderr_handle = spawn_reader(stderr, log_buf.clone());

    let start = Instant::now();
    let mut cancelled = false;
    let mut timed_out = false;

    let exit_status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) => {}
            Err(_) => break None,
        }

        if cancel.is_cancelled() {
            cancelled = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        if let Some(timeout) = cmd.timeout
            && start.elapsed() > timeout
        {
            timed_out = true;
            let _ = child.kill();
            let _ = child.wait();
            break None;
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    let _ = stdout_handle.join();
    let _ = stderr_handle.join();

    let exit_code = exit_status.and_then(|s| s.code());
    let log = log_buf.lock().map(|b| b.clone()).unwrap_or_default();

    Ok(ContainerResult {
        exit_code,
        log,
        timed_out,
        cancelled,
    })
}

fn spawn_reader<R>(pipe: R, buf: Arc<Mutex<String>>) -> std::thread::JoinHandle<()>
where
    R: std::io::Read + Send + 'static,
{
    std::thread::spawn(move || {
        let reader = std::io::BufReader::new(pipe);
        for line in reader.lines() {
            match line {
                Ok(l) => {
                    log::debug!("container: {l}");
                    if let Ok(mut buf) = buf.lock() {
                        buf.push_str(&l);
                        buf.push('\n');
                    }
                }
                Err(_) => break,
            }
        }
    })
}
