//! File-based license store with atomic writes.
//!
//! Stores the license record as JSON under `dirs::data_dir()/<namespace>/`.
//! Uses temp file + rename so a failed save leaves the previous record
//! intact.

use crate::protocol::models::LicenseSnapshot;
use crate::store::LicenseStore;
use crate::LicensewardError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const LICENSE_FILE: &str = "license.json";

/// File-based license store.
#[derive(Debug)]
pub struct FileLicenseStore {
    /// Path of the license record.
    path: PathBuf,
}

impl FileLicenseStore {
    /// Create a store under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, LicensewardError> {
        let base_dir = dirs::data_dir().ok_or_else(|| {
            LicensewardError::PersistenceIO("Could not find data directory".to_string())
        })?;

        Self::with_dir(base_dir.join(namespace))
    }

    /// Create a store in a specific directory.
    pub fn with_dir(dir: PathBuf) -> Result<Self, LicensewardError> {
        fs::create_dir_all(&dir).map_err(|e| {
            LicensewardError::PersistenceIO(format!("Failed to create store dir: {}", e))
        })?;

        Ok(Self {
            path: dir.join(LICENSE_FILE),
        })
    }

    /// Path of the license record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the license record, if any.
    pub fn delete(&self) -> Result<(), LicensewardError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LicensewardError::PersistenceIO(format!(
                "Failed to delete license: {}",
                e
            ))),
        }
    }
}

impl LicenseStore for FileLicenseStore {
    fn save(&self, snapshot: &LicenseSnapshot) -> Result<(), LicensewardError> {
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| {
            LicensewardError::PersistenceIO(format!("Failed to serialize license: {}", e))
        })?;

        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &json).map_err(|e| {
            LicensewardError::PersistenceIO(format!("Failed to write temp file: {}", e))
        })?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            LicensewardError::PersistenceIO(format!("Failed to rename license file: {}", e))
        })?;

        Ok(())
    }

    fn load(&self) -> Result<LicenseSnapshot, LicensewardError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LicensewardError::LicenseNotFound)
            }
            Err(e) => {
                return Err(LicensewardError::PersistenceIO(format!(
                    "Failed to read license file: {}",
                    e
                )))
            }
        };

        serde_json::from_str(&json).map_err(|e| LicensewardError::LicenseCorrupt(e.to_string()))
    }
}
