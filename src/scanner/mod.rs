//! Local library scanning.
//!
//! [`scan`] walks a directory tree and streams audio file paths;
//! [`scan_tracks`] reads the tags of every file into [`LocalTrack`]s.
//! Files whose tags cannot be read are reported and skipped.

use futures::StreamExt;
use futures::stream::Stream;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::metadata;
use crate::model::LocalTrack;

/// Extensions picked up by the scanner (lowercase).
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "opus", "wav", "m4a", "aac", "aif", "aiff", "ape", "wv", "wma",
];

/// Tracks read from a directory plus the files that could not be read.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub tracks: Vec<LocalTrack>,
    pub errors: Vec<ScanError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub path: PathBuf,
    pub message: String,
}

/// Whether a path has an audio extension (case-insensitive).
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scans the given root directory recursively for audio files.
///
/// Returns a Stream of PathBufs.
pub fn scan(root: PathBuf) -> impl Stream<Item = PathBuf> {
    let (tx, rx) = mpsc::channel(100);

    // Spawn a blocking task to perform the synchronous file system traversal
    tokio::task::spawn_blocking(move || {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_audio_file(entry.path()) {
                // If the receiver is dropped, blocking_send errors and we stop scanning.
                if tx.blocking_send(entry.path().to_path_buf()).is_err() {
                    break;
                }
            }
        }
    });

    // Convert the mpsc Receiver into a Stream
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|path| (path, rx))
    })
}

/// Scan `root` and read every audio file's tags.
///
/// Tracks come back sorted by path. A missing root is an error; an
/// unreadable file is not.
pub async fn scan_tracks(root: &Path) -> Result<ScanOutcome> {
    if !root.is_dir() {
        return Err(Error::not_found(root));
    }

    tracing::info!(root = %root.display(), "Scanning local files");

    let mut paths: Vec<PathBuf> = scan(root.to_path_buf()).collect().await;
    paths.sort();

    let root = root.to_path_buf();
    let read = tokio::task::spawn_blocking(move || {
        paths
            .par_iter()
            .map(|path| {
                metadata::read(path)
                    .map(|meta| LocalTrack::new(path.clone(), meta, folder_artist(&root, path)))
                    .map_err(|e| ScanError {
                        path: path.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| Error::Io(std::io::Error::other(e)))?;

    let mut outcome = ScanOutcome::default();
    for item in read {
        match item {
            Ok(track) => outcome.tracks.push(track),
            Err(err) => {
                tracing::warn!(file = %err.path.display(), "Skipping unreadable file: {}", err.message);
                outcome.errors.push(err);
            }
        }
    }

    tracing::info!(
        tracks = outcome.tracks.len(),
        errors = outcome.errors.len(),
        "Scan finished"
    );

    Ok(outcome)
}

/// Artist folder of an `Artist/Album/file` layout below `root`.
pub fn folder_artist(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let components: Vec<_> = relative.components().collect();
    if components.len() < 3 {
        return None;
    }
    components[components.len() - 3]
        .as_os_str()
        .to_str()
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_scan_audio_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        // Create dummy files in root
        File::create(root.join("song.mp3")).unwrap();
        File::create(root.join("music.flac")).unwrap();
        File::create(root.join("notes.txt")).unwrap(); // Should be ignored
        File::create(root.join("image.png")).unwrap(); // Should be ignored
        File::create(root.join("UPPERCASE.OGG")).unwrap(); // Should be found (case-insensitive)

        // Create subdirectory
        let subdir = root.join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("track.wav")).unwrap();
        File::create(subdir.join("ignore.doc")).unwrap(); // Should be ignored

        let paths: Vec<PathBuf> = scan(root.to_path_buf()).collect().await;

        let file_names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(|s| s.to_string()))
            .collect();

        assert_eq!(paths.len(), 4);
        assert!(file_names.contains(&"song.mp3".to_string()));
        assert!(file_names.contains(&"music.flac".to_string()));
        assert!(file_names.contains(&"track.wav".to_string()));
        assert!(file_names.contains(&"UPPERCASE.OGG".to_string()));
        assert!(!file_names.contains(&"notes.txt".to_string()));
    }

    #[tokio::test]
    async fn test_scan_tracks_reports_unreadable_files() {
        let dir = tempdir().unwrap();
        let album = dir.path().join("Artist/Album");
        std::fs::create_dir_all(&album).unwrap();
        std::fs::write(album.join("broken.mp3"), b"not really audio").unwrap();

        let outcome = scan_tracks(dir.path()).await.unwrap();

        assert!(outcome.tracks.is_empty());
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].path.ends_with("broken.mp3"));
    }

    #[tokio::test]
    async fn test_scan_tracks_missing_root() {
        let dir = tempdir().unwrap();
        let result = scan_tracks(&dir.path().join("missing")).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_folder_artist_from_layout() {
        let root = Path::new("/music");
        assert_eq!(
            folder_artist(root, Path::new("/music/Artist/Album/01.mp3")).as_deref(),
            Some("Artist")
        );
        assert_eq!(
            folder_artist(root, Path::new("/music/Genre/Artist/Album/01.mp3")).as_deref(),
            Some("Artist")
        );
        assert_eq!(folder_artist(root, Path::new("/music/Album/01.mp3")), None);
        assert_eq!(folder_artist(root, Path::new("/elsewhere/A/B/01.mp3")), None);
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("a.FLAC")));
        assert!(is_audio_file(Path::new("a.opus")));
        assert!(!is_audio_file(Path::new("a.txt")));
        assert!(!is_audio_file(Path::new("noext")));
    }
}
