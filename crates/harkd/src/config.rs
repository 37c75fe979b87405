use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::StartupError;

/// Name of the state document inside the state directory.
pub const STATE_FILE_NAME: &str = "hark-state.json";

/// Configuration for the harkd server.
#[derive(Parser, Debug, Clone)]
#[command(name = "harkd")]
#[command(about = "HTTP daemon managing virtual machine metadata")]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1", env = "HARKD_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value = "8080", env = "HARKD_PORT")]
    pub port: u16,

    /// Directory holding the state file (defaults to ~/.hark)
    #[arg(long, env = "HARKD_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Retries on a contended state lock before the write fails
    #[arg(long, default_value = "5", env = "HARKD_LOCK_RETRIES")]
    pub lock_retries: u32,

    /// Delay between state lock attempts, in milliseconds
    #[arg(long, default_value = "50", env = "HARKD_LOCK_RETRY_DELAY_MS")]
    pub lock_retry_delay_ms: u64,
}

impl Config {
    /// Get the effective state directory.
    pub fn effective_state_dir(&self) -> Result<PathBuf, StartupError> {
        match &self.state_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".hark"))
                .ok_or(StartupError::HomeDirUnavailable),
        }
    }

    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock_retry_delay_ms)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["harkd"]);
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.lock_retries, 5);
        assert_eq!(config.lock_retry_delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_explicit_state_dir_wins() {
        let config = Config::parse_from(["harkd", "--state-dir", "/var/lib/hark", "--port", "9000"]);
        assert_eq!(
            config.effective_state_dir().unwrap(),
            PathBuf::from("/var/lib/hark")
        );
        assert_eq!(config.port, 9000);
    }
}
