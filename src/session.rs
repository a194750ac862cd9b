//! Explicit session context carried between stages.
//!
//! Each CLI invocation loads the session, runs one stage over it and saves
//! it back. Replacing an earlier stage's output clears everything derived
//! from it, so a later stage never works on stale input.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};
use crate::matching::MatchResult;
use crate::model::{LocalTrack, RemoteTrack};
use crate::organizer::{MovePlan, RenamePreviewReport};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Directory the local tracks were scanned from
    pub scan_root: Option<PathBuf>,
    pub local_tracks: Vec<LocalTrack>,
    pub remote_snapshot: Vec<RemoteTrack>,
    pub match_results: Vec<MatchResult>,
    pub previews: Option<RenamePreviewReport>,
    pub plan: Option<MovePlan>,
    /// RFC 3339 time of the last save
    pub updated_at: Option<String>,
}

impl Session {
    /// Load a session; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No session file, starting fresh");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(format!("Failed to read session {}", path.display()))?;
        let session: Self = serde_json::from_str(&contents)
            .with_context(format!("Failed to parse session {}", path.display()))?;
        Ok(session)
    }

    /// Save atomically (temp file, then rename).
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)
                .with_context(format!("Failed to create directory {}", dir.display()))?;
        }

        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(format!("Failed to write session {}", temp_path.display()))?;
        fs::rename(&temp_path, path)
            .with_context(format!("Failed to replace session {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Saved session");
        Ok(())
    }

    /// Store a new scan; matches, previews and plan are dropped.
    pub fn set_local_tracks(&mut self, root: PathBuf, tracks: Vec<LocalTrack>) {
        self.scan_root = Some(root);
        self.local_tracks = tracks;
        self.match_results.clear();
        self.previews = None;
        self.plan = None;
    }

    /// Store a new live library snapshot; the plan is dropped.
    pub fn set_remote_snapshot(&mut self, snapshot: Vec<RemoteTrack>) {
        self.remote_snapshot = snapshot;
        self.plan = None;
    }

    /// Store auto-match results; previews and plan are dropped.
    pub fn set_match_results(&mut self, results: Vec<MatchResult>) {
        self.match_results = results;
        self.previews = None;
        self.plan = None;
    }

    /// Store a rename preview; the plan is dropped.
    pub fn set_previews(&mut self, previews: RenamePreviewReport) {
        self.previews = Some(previews);
        self.plan = None;
    }

    pub fn set_plan(&mut self, plan: MovePlan) {
        self.plan = Some(plan);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::MoveMode;
    use crate::test_utils::{local_track, remote_track};
    use tempfile::tempdir;

    #[test]
    fn test_missing_session_is_empty() {
        let temp = tempdir().unwrap();
        let session = Session::load(&temp.path().join("session.json")).unwrap();
        assert!(session.local_tracks.is_empty());
        assert!(session.plan.is_none());
    }

    #[test]
    fn test_session_save_and_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/session.json");

        let mut session = Session::default();
        session.set_local_tracks(
            PathBuf::from("/music"),
            vec![local_track("/music/A/B/c.flac", "A", "B", "C", "flac", None)],
        );
        session.set_remote_snapshot(vec![remote_track("A", "B", "C", "mp3", Some(320))]);
        session.save(&path).unwrap();

        let loaded = Session::load(&path).unwrap();
        assert_eq!(loaded.scan_root, Some(PathBuf::from("/music")));
        assert_eq!(loaded.local_tracks, session.local_tracks);
        assert_eq!(loaded.remote_snapshot, session.remote_snapshot);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_new_scan_clears_downstream() {
        let mut session = Session::default();
        session.set_previews(RenamePreviewReport::default());
        session.set_plan(MovePlan {
            mode: MoveMode::Force,
            ..Default::default()
        });

        session.set_local_tracks(PathBuf::from("/music"), vec![]);

        assert!(session.previews.is_none());
        assert!(session.plan.is_none());
    }
}
