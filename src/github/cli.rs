use super::remote::GitHubRepo;
use crate::error::{DevReportError, Result};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// The hosting-platform operations the PR fetcher depends on.
pub trait HostingCli: Send + Sync {
    /// Whether the CLI is installed and authenticated.
    fn check_available(&self) -> bool;

    /// Raw JSON array of the current user's pull requests on `repo`, any state.
    fn list_pull_requests(&self, repo: &GitHubRepo, limit: usize) -> Result<String>;
}

/// `gh` subprocess backend.
#[derive(Debug, Clone)]
pub struct GhCli {
    timeout: Duration,
}

impl Default for GhCli {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GhCli {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl HostingCli for GhCli {
    fn check_available(&self) -> bool {
        let mut cmd = Command::new("gh");
        cmd.args(["auth", "status"]);
        match run_with_timeout(cmd, self.timeout) {
            Ok(output) => output.status.success(),
            Err(e) => {
                debug!("gh auth status failed: {e}");
                false
            }
        }
    }

    fn list_pull_requests(&self, repo: &GitHubRepo, limit: usize) -> Result<String> {
        let mut cmd = Command::new("gh");
        cmd.args(["pr", "list", "--repo"])
            .arg(repo.slug())
            .args(["--author", "@me", "--state", "all"])
            .args(["--json", "number,title,state,createdAt,mergedAt,url"])
            .arg("--limit")
            .arg(limit.to_string());

        let output = run_with_timeout(cmd, self.timeout)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DevReportError::Hosting(stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Run `cmd` to completion, killing it once `timeout` elapses.
///
/// Pipes are drained on helper threads so a chatty child cannot block on a
/// full pipe while we poll.
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<Output> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DevReportError::Hosting(format!(
                "timed out after {}",
                humantime::format_duration(timeout)
            )));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
