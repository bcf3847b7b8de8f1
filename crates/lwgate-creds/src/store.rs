//! Credential Store - the in-memory record set and its database file
//!
//! Records are kept in insertion order. Identifiers are not checked for
//! uniqueness on insert; lookups return the first case-insensitive match.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::entry::{
    create_from_validated_existing, validate_existing_entry, DeviceCredential, FullView,
    PublicView,
};
use crate::error::{CredentialError, CredentialResult};

/// In-memory set of device credentials
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: Vec<DeviceCredential>,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given records
    pub fn from_records(records: Vec<DeviceCredential>) -> Self {
        Self { records }
    }

    /// Load the store from a database file.
    ///
    /// A missing file yields an empty store so a fresh database can be
    /// initialised. Invalid entries are skipped; a file that is not a JSON
    /// array fails the whole load.
    pub fn load(path: &Path) -> CredentialResult<Self> {
        let content = match std::fs::read(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "Devices database not found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_slice(&content)?;
        let entries = value.as_array().ok_or(CredentialError::NotAnArray)?;

        if entries.is_empty() {
            info!(path = %path.display(), "Devices database is empty");
            return Ok(Self::new());
        }

        let mut records = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let record =
                validate_existing_entry(entry).and_then(|_| create_from_validated_existing(entry));

            match record {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(index, error = %e, "Skipping invalid devices database entry");
                }
            }
        }

        info!(path = %path.display(), count = records.len(), "Loaded devices database");
        Ok(Self { records })
    }

    /// Persist the full record set.
    ///
    /// `None` disables persistence and succeeds without touching the
    /// filesystem. The file is written next to the target and renamed over
    /// it, so a failed write leaves the previous database intact.
    pub fn save(&self, path: Option<&Path>) -> CredentialResult<()> {
        let Some(path) = path else {
            return Ok(());
        };

        let views: Vec<FullView> = self.records.iter().map(|r| r.to_full_view()).collect();
        let content = serde_json::to_vec(&views)?;

        let tmp = temp_path(path);
        std::fs::write(&tmp, content)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), count = self.records.len(), "Saved devices database");
        Ok(())
    }

    /// Append a record
    pub fn insert(&mut self, record: DeviceCredential) {
        self.records.push(record);
    }

    /// Find the first record matching `id` (case-insensitive)
    pub fn find_by_id(&self, id: &str) -> Option<&DeviceCredential> {
        self.records.iter().find(|r| r.matches(id))
    }

    /// Mutable variant of [`find_by_id`](Self::find_by_id)
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut DeviceCredential> {
        self.records.iter_mut().find(|r| r.matches(id))
    }

    /// Remove the first record matching `id`, returning it
    pub fn delete_by_id(&mut self, id: &str) -> CredentialResult<DeviceCredential> {
        let index = self
            .records
            .iter()
            .position(|r| r.matches(id))
            .ok_or_else(|| CredentialError::NotFound(id.to_string()))?;

        Ok(self.records.remove(index))
    }

    /// All records in insertion order
    pub fn records(&self) -> &[DeviceCredential] {
        &self.records
    }

    /// Public views of all records
    pub fn public_views(&self) -> Vec<PublicView> {
        self.records.iter().map(|r| r.to_public_view()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
