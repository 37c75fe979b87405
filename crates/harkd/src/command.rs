//! Running external commands.

use async_trait::async_trait;
use tokio::process::Command;

/// Outcome of a command run to completion with its output buffered.
#[derive(Debug, Default)]
pub struct SimpleResult {
    /// Exit status, or -1 if the process never ran or was killed by a signal
    pub exit_status: i32,
    /// stdout followed by stderr
    pub output: Vec<u8>,
    pub error: Option<String>,
}

impl SimpleResult {
    pub fn success(&self) -> bool {
        self.error.is_none() && self.exit_status == 0
    }
}

/// Capability to locate and run executables.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Whether `name` resolves to an executable on the search path.
    fn have_on_path(&self, name: &str) -> bool;

    /// Run `name` with `args` and wait for it to finish.
    async fn run_simple(&self, name: &str, args: &[&str]) -> SimpleResult;
}

/// Runs real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    fn have_on_path(&self, name: &str) -> bool {
        which::which(name).is_ok()
    }

    async fn run_simple(&self, name: &str, args: &[&str]) -> SimpleResult {
        match Command::new(name).args(args).output().await {
            Ok(out) => {
                let mut output = out.stdout;
                output.extend_from_slice(&out.stderr);
                let exit_status = out.status.code().unwrap_or(-1);
                let error = (!out.status.success())
                    .then(|| format!("{} exited with {}", name, out.status));
                SimpleResult {
                    exit_status,
                    output,
                    error,
                }
            }
            Err(e) => SimpleResult {
                exit_status: -1,
                output: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_and_capture_output() {
        let runner = SystemCommandRunner;
        assert!(runner.have_on_path("sh"));

        let result = runner
            .run_simple("sh", &["-c", "echo out; echo err >&2"])
            .await;
        assert!(result.success());
        assert_eq!(String::from_utf8_lossy(&result.output), "out\nerr\n");
    }

    #[tokio::test]
    async fn test_failures() {
        let runner = SystemCommandRunner;

        let result = runner.run_simple("sh", &["-c", "exit 3"]).await;
        assert_eq!(result.exit_status, 3);
        assert!(!result.success());

        assert!(!runner.have_on_path("definitely-not-a-real-binary-hark"));
        let result = runner
            .run_simple("definitely-not-a-real-binary-hark", &[])
            .await;
        assert_eq!(result.exit_status, -1);
        assert!(result.error.is_some());
    }
}
