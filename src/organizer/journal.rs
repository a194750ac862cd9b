//! Rollback journal for the most recent executed batch.
//!
//! Only one journal exists at a time. Executing a new batch replaces it, so
//! the previous batch can no longer be rolled back.
//!
//! The journal is stored as JSON so a later process can roll back a batch
//! executed by an earlier one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};

/// One applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Where the file was before the batch
    pub source: PathBuf,
    /// Where the batch put it
    pub destination: PathBuf,
    /// Pre-existing file deleted by a REPLACE; cannot be restored
    #[serde(default)]
    pub deleted_existing: Option<PathBuf>,
    /// The deletion was already reported by an earlier rollback attempt
    #[serde(default)]
    pub loss_reported: bool,
}

impl JournalEntry {
    pub fn moved(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            deleted_existing: None,
            loss_reported: false,
        }
    }

    pub fn is_irreversible(&self) -> bool {
        self.deleted_existing.is_some()
    }
}

/// Ordered record of the moves applied by one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackJournal {
    pub batch_id: String,
    /// RFC 3339 timestamp of the batch start
    pub created_at: String,
    pub entries: Vec<JournalEntry>,
}

impl Default for RollbackJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl RollbackJournal {
    /// Start an empty journal stamped with the current time.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            batch_id: now.format("batch-%Y%m%dT%H%M%S%.3fZ").to_string(),
            created_at: now.to_rfc3339(),
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose REPLACE deleted a file for good.
    pub fn irreversible(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(|e| e.is_irreversible())
    }

    /// Load a journal; `None` when no file exists.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(format!("Failed to read journal {}", path.display()))?;
        let journal: Self = serde_json::from_str(&contents)
            .with_context(format!("Failed to parse journal {}", path.display()))?;
        Ok(Some(journal))
    }

    /// Write the journal atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(format!("Failed to create directory {}", dir.display()))?;
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(format!("Failed to write journal {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(format!("Failed to replace journal {}", path.display()))?;

        tracing::debug!(path = %path.display(), entries = self.len(), "Saved rollback journal");
        Ok(())
    }

    /// Remove a stored journal, if any.
    pub fn clear(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(format!("Failed to remove journal {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_journal_save_and_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state/journal.json");

        let mut journal = RollbackJournal::new();
        journal.record(JournalEntry::moved("/original/path.mp3", "/new/path.mp3"));
        journal.record(JournalEntry {
            source: PathBuf::from("/original/b.flac"),
            destination: PathBuf::from("/new/b.flac"),
            deleted_existing: Some(PathBuf::from("/new/b.mp3")),
            loss_reported: false,
        });
        journal.save(&path).unwrap();

        let loaded = RollbackJournal::load(&path).unwrap().unwrap();
        assert_eq!(loaded, journal);
        assert_eq!(loaded.irreversible().count(), 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_journal_without_loss_flag_still_loads() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("journal.json");
        std::fs::write(
            &path,
            r#"{"batch_id":"b1","created_at":"2024-01-01T00:00:00Z","entries":[
                {"source":"/a.flac","destination":"/b.flac","deleted_existing":"/b.mp3"}]}"#,
        )
        .unwrap();

        let loaded = RollbackJournal::load(&path).unwrap().unwrap();
        assert!(!loaded.entries[0].loss_reported);
        assert!(loaded.entries[0].is_irreversible());
    }

    #[test]
    fn test_missing_journal_loads_as_none() {
        let temp = tempdir().unwrap();
        assert!(RollbackJournal::load(&temp.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("journal.json");
        RollbackJournal::new().save(&path).unwrap();

        RollbackJournal::clear(&path).unwrap();
        assert!(!path.exists());
        RollbackJournal::clear(&path).unwrap();
    }

    #[test]
    fn test_corrupt_journal_is_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("journal.json");
        fs::write(&path, "not json").unwrap();
        assert!(RollbackJournal::load(&path).is_err());
    }
}
