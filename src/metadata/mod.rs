//! Audio file metadata reading.
//!
//! Uses the lofty crate for format-independent metadata access.
//! Supports MP3, FLAC, OGG/Opus, M4A, WAV, AIFF, APE and WavPack files.
//!
//! Only the fields the reconciler needs are read: artist, album, title,
//! track number and bitrate. The format comes from the file extension,
//! except that an M4A reporting a bit depth is ALAC rather than AAC.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{TrackDescriptor, file_extension, normalize_format};

/// Read a file's tags into a descriptor.
///
/// Missing tags become `"Unknown"`; the caller decides on fallbacks.
pub fn read(path: &Path) -> Result<TrackDescriptor> {
    // Probe the file to determine format and read tags
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("Failed to open file for probing: {}", e)))?
        .read()
        .map_err(|e| Error::metadata(path, format!("Failed to read file metadata: {}", e)))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| t.title().map(|s| s.to_string())).unwrap_or_default();
    let artist = tag.and_then(|t| t.artist().map(|s| s.to_string())).unwrap_or_default();
    let album = tag.and_then(|t| t.album().map(|s| s.to_string())).unwrap_or_default();
    let track_number = tag.and_then(|t| t.track());

    let properties = tagged_file.properties();
    let format = format_for(
        file_extension(path).as_deref().unwrap_or_default(),
        properties.bit_depth(),
    );

    Ok(TrackDescriptor::new(&artist, &album, &title, &format)
        .with_bitrate(properties.audio_bitrate())
        .with_track_number(track_number))
}

/// Canonical format for an extension.
///
/// M4A is a container for both AAC and ALAC; only lossless streams carry a
/// bit depth.
pub fn format_for(extension: &str, bit_depth: Option<u8>) -> String {
    match extension.to_lowercase().as_str() {
        "m4a" | "mp4" if bit_depth.is_some() => "alac".to_string(),
        other => normalize_format(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_non_audio_file_returns_error() {
        // Create a temporary text file
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "This is just some text, not music.").expect("Failed to write to temp file");

        // Should fail because it's not a valid audio file
        let result = read(file.path());
        assert!(matches!(result, Err(Error::Metadata { .. })));
    }

    #[test]
    fn test_read_non_existent_file_returns_error() {
        let path = Path::new("non_existent_file.mp3");
        let result = read(path);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_for_extension() {
        assert_eq!(format_for("FLAC", Some(16)), "flac");
        assert_eq!(format_for("mp3", None), "mp3");
        assert_eq!(format_for("ogg", None), "vorbis");
        assert_eq!(format_for("m4a", None), "aac");
        assert_eq!(format_for("m4a", Some(24)), "alac");
        assert_eq!(format_for("", None), "unknown");
    }
}
