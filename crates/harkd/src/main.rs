//! harkd entry point.

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use hark_core::StateStore;
use hark_store_local::{FileLock, JsonFileStore};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use harkd::command::SystemCommandRunner;
use harkd::config::{Config, STATE_FILE_NAME};
use harkd::error::StartupError;
use harkd::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting harkd v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);

    let state_dir = config.effective_state_dir()?;
    ensure_state_dir(&state_dir)?;
    let state_path = state_dir.join(STATE_FILE_NAME);
    info!("  State file: {}", state_path.display());

    // One lock for the whole process, shared with the store
    let lock = Arc::new(
        FileLock::new(JsonFileStore::lock_path_for(&state_path))
            .with_retry_policy(config.lock_retries, config.lock_retry_delay()),
    );
    info!(
        "  Lock: {} ({} retries, {}ms apart)",
        lock.path().display(),
        config.lock_retries,
        config.lock_retry_delay_ms
    );

    let file_store = JsonFileStore::new(&state_path, lock);
    file_store.initialize().await.map_err(StartupError::State)?;
    let store: Arc<dyn StateStore> = Arc::new(file_store);
    info!("  Backend: {}", store.backend_name());

    let app = server::build_app(store, Arc::new(SystemCommandRunner))?;

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    server::serve(listener, app).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the state directory (owner-only on Unix) if it is missing.
fn ensure_state_dir(dir: &Path) -> Result<(), StartupError> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    builder.create(dir).map_err(|source| StartupError::StateDir {
        path: dir.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_state_dir_creates_missing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("nested").join(".hark");

        ensure_state_dir(&dir).unwrap();
        assert!(dir.is_dir());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&dir).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o700);
        }

        // Idempotent
        ensure_state_dir(&dir).unwrap();
    }

    #[test]
    fn test_ensure_state_dir_rejects_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("taken");
        std::fs::write(&file, b"").unwrap();

        assert!(matches!(
            ensure_state_dir(&file),
            Err(StartupError::StateDir { .. })
        ));
    }
}
