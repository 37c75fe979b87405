use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use hark_core::{HarkError, LockManager, Machine, StateDocument, StateStore, Validate};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::lock::FileLock;

/// Suffix appended to the state file path to name its lock file.
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// State store backed by a single JSON file.
///
/// ```text
/// {state_dir}/
///   hark-state.json        {"machines":[{"id":..,"name":..,"memoryMB":..}]}
///   hark-state.json.lock   cross-process writer lock
/// ```
///
/// Reads take no lock. Writes hold the lock manager's lock, reload the file,
/// and replace it whole through a temp file and rename.
#[derive(Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Arc<dyn LockManager>,
}

impl JsonFileStore {
    /// Create a store on `path` guarded by `lock`.
    pub fn new(path: impl AsRef<Path>, lock: Arc<dyn LockManager>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock,
        }
    }

    /// Create a store on `path` with a [`FileLock`] on the sibling lock file.
    pub fn with_file_lock(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let lock = Arc::new(FileLock::new(Self::lock_path_for(&path)));
        Self { path, lock }
    }

    /// Path of the lock file that coordinates writers of `state_path`.
    pub fn lock_path_for(state_path: &Path) -> PathBuf {
        let mut name = state_path.as_os_str().to_os_string();
        name.push(LOCK_FILE_SUFFIX);
        PathBuf::from(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    /// Write an empty document if the state file does not exist yet.
    ///
    /// The file is created with create-new semantics so a concurrent
    /// initializer never clobbers a document somebody else already wrote.
    #[instrument(skip(self), level = "debug")]
    pub async fn initialize(&self) -> Result<(), HarkError> {
        match fs::try_exists(&self.path).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => {
                return Err(HarkError::internal(format!(
                    "Failed to stat {}: {}",
                    self.path.display(),
                    e
                )))
            }
        }

        let json = StateDocument::default().to_json()?;
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(()),
            Err(e) => return Err(HarkError::state_persist(e)),
        };
        file.write_all(&json)
            .await
            .map_err(HarkError::state_persist)?;
        file.flush().await.map_err(HarkError::state_persist)?;

        debug!("Initialized empty state at {}", self.path.display());
        Ok(())
    }

    /// Load the document straight from disk.
    #[instrument(skip(self), level = "debug")]
    pub async fn load_document(&self) -> Result<StateDocument, HarkError> {
        self.initialize().await?;

        let bytes = fs::read(&self.path).await.map_err(|e| {
            HarkError::internal(format!("Failed to read {}: {}", self.path.display(), e))
        })?;
        let document = StateDocument::from_json(&bytes)?;

        debug!("Loaded state with {} machines", document.machines.len());
        Ok(document)
    }

    #[instrument(skip(self, document), level = "debug", fields(machines = document.machines.len()))]
    async fn save_document(&self, document: &StateDocument) -> Result<(), HarkError> {
        let json = document.to_json()?;

        // Write atomically via temp file
        let temp_path = self.temp_path();
        fs::write(&temp_path, &json)
            .await
            .map_err(HarkError::state_persist)?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(HarkError::state_persist)?;

        debug!("Saved state with {} machines", document.machines.len());
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    fn backend_name(&self) -> &'static str {
        "json-file"
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, HarkError> {
        Ok(self.load_document().await?.machines)
    }

    #[instrument(skip(self, machine), level = "debug", fields(machine_id = %machine.id))]
    async fn create_machine(&self, machine: Machine) -> Result<(), HarkError> {
        machine.validate()?;

        // Held until the end of scope on every early return below
        let guard = self.lock.acquire().await?;

        // Reload under the lock; another process may have written since our
        // last read.
        let mut document = self.load_document().await?;
        document.insert(machine)?;
        self.save_document(&document).await?;

        // The document is already replaced; an unlock failure must not turn
        // a stored write into an error
        if let Err(e) = guard.release() {
            warn!("Saved state but failed to release lock: {}", e);
        }
        Ok(())
    }
}
