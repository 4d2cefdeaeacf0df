// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the service state across daemon restarts and crashes so the
// engine resumes with the same published target, health flags and
// hysteresis streaks instead of re-deciding from scratch.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "state": {
//     "target1_up": true,
//     "target2_up": true,
//     "current_target": "192.0.2.1",
//     "last_switch_at": "2025-01-09T12:00:00Z",
//     "freeze": false,
//     "ttl": 60,
//     "webhook_shared_secret": "…",
//     "up_threshold": 1,
//     "down_threshold": 1,
//     "cooldown_seconds": 0,
//     "s1_up_streak": 0,
//     "s1_down_streak": 0,
//     "s2_up_streak": 0,
//     "s2_down_streak": 0
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::Error;
use crate::model::ServiceState;
use crate::traits::state_store::StateStore;

/// State file format version
/// Used for future migration if format changes
const STATE_FILE_VERSION: &str = "1.0";

/// File-based state store with crash recovery
///
/// # Crash Recovery
///
/// - **Atomic writes**: New state written to temporary file, then renamed
/// - **Backup**: Last known good state kept in `.backup` file
/// - **Corruption detection**: JSON validation on load
/// - **Automatic recovery**: Falls back to backup if main file corrupted
///
/// # Example
///
/// ```rust,no_run
/// use failover_core::state::FileStateStore;
/// use failover_core::traits::StateStore;
/// use failover_core::ServiceState;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("/var/lib/failover/state.json").await?;
///
///     let state = ServiceState::initial("192.0.2.1".parse()?, 60);
///     store.save(&state).await?;
///
///     assert_eq!(store.load().await?, Some(state));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileStateStore {
    path: PathBuf,
    /// Serializes writers so temp file and backup are never shared
    write_lock: Mutex<()>,
}

/// Serializable state file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StateFileFormat {
    version: String,
    state: ServiceState,
}

impl FileStateStore {
    /// Create a file state store
    ///
    /// Creates parent directories if needed. Nothing is read until
    /// [`StateStore::load`] is called.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create state directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// Load state from file with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load main state file
    /// 2. If it is unreadable, try loading backup
    /// 3. If backup also fails, report the original error
    async fn load_with_recovery(&self) -> Result<Option<ServiceState>, Error> {
        let err = match Self::load_file(&self.path).await {
            Ok(state) => return Ok(state),
            Err(e) => e,
        };

        tracing::warn!(
            "State file appears corrupted: {}. Attempting recovery from backup.",
            err
        );

        let backup_path = Self::backup_path(&self.path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found.");
            return Err(err);
        }

        match Self::load_file(&backup_path).await {
            Ok(Some(state)) => {
                tracing::info!("Recovered service state from backup");
                if let Err(restore_err) = Self::restore_from_backup(&self.path, &backup_path).await
                {
                    tracing::error!(
                        "Failed to restore state file from backup: {}",
                        restore_err
                    );
                }
                Ok(Some(state))
            }
            Ok(None) => Err(err),
            Err(backup_err) => {
                tracing::error!("Backup also corrupted: {}", backup_err);
                Err(err)
            }
        }
    }

    /// Load state from one file
    async fn load_file(path: &Path) -> Result<Option<ServiceState>, Error> {
        if !path.exists() {
            tracing::debug!("State file does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read state file {}: {}",
                path.display(),
                e
            ))
        })?;

        let state_file: StateFileFormat = serde_json::from_str(&content).map_err(|e| {
            Error::state_store(format!(
                "Failed to parse state file {}: {}",
                path.display(),
                e
            ))
        })?;

        if state_file.version != STATE_FILE_VERSION {
            tracing::warn!(
                "State file version mismatch: expected {}, got {}. \
                Attempting to load anyway.",
                STATE_FILE_VERSION,
                state_file.version
            );
        }

        Ok(Some(state_file.state))
    }

    /// Write state to file atomically
    async fn write_state(&self, state: &ServiceState) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;

        let state_file = StateFileFormat {
            version: STATE_FILE_VERSION.to_string(),
            state: state.clone(),
        };

        let json = serde_json::to_string_pretty(&state_file)
            .map_err(|e| Error::state_store(format!("Failed to serialize state: {}", e)))?;

        // Write to temporary file first
        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Create backup of current file (if it exists)
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        // Atomic rename (temp -> actual)
        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("State written to file: {}", self.path.display());
        Ok(())
    }

    /// Restore state file from backup
    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::info!("Restored state file from backup");
        Ok(())
    }

    /// Get path to temporary file for atomic writes
    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    /// Get path to backup file
    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<ServiceState>, Error> {
        self.load_with_recovery().await
    }

    async fn save(&self, state: &ServiceState) -> Result<(), Error> {
        self.write_state(state).await
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
