//! CSV export of a comparison report.
//!
//! Column order is fixed: Artist, Album, Title, Offline Format, Offline
//! Bitrate, Plex Format, Plex Bitrate, Status, Recommendation. Unknown
//! bitrates and missing remote fields are empty cells.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::ComparisonReport;
use crate::error::{Result, ResultExt};

pub const HEADER: [&str; 9] = [
    "Artist",
    "Album",
    "Title",
    "Offline Format",
    "Offline Bitrate",
    "Plex Format",
    "Plex Bitrate",
    "Status",
    "Recommendation",
];

fn bitrate_cell(bitrate: Option<u32>) -> String {
    bitrate.map(|b| b.to_string()).unwrap_or_default()
}

/// Write the itemized conflicts of `report` as CSV.
pub fn write_csv<W: Write>(report: &ComparisonReport, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HEADER)?;

    for conflict in &report.conflicts {
        let local = &conflict.local.metadata;
        let remote = conflict.remote.as_ref().map(|r| &r.descriptor);
        let local_bitrate = bitrate_cell(local.bitrate_kbps);
        let remote_bitrate = bitrate_cell(remote.and_then(|r| r.bitrate_kbps));

        csv.write_record([
            local.artist.as_str(),
            local.album.as_str(),
            local.title.as_str(),
            local.format.as_str(),
            local_bitrate.as_str(),
            remote.map(|r| r.format.as_str()).unwrap_or(""),
            remote_bitrate.as_str(),
            conflict.category.as_str(),
            conflict.recommendation.as_str(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Write the report to a CSV file, replacing any existing file.
pub fn export_csv(report: &ComparisonReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(format!("creating {}", path.display()))?;
    write_csv(report, file)?;
    tracing::info!(
        path = %path.display(),
        rows = report.conflicts.len(),
        "Exported conflict report"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_libraries;
    use crate::test_utils::{local_track, remote_track};

    #[test]
    fn test_csv_header_and_row() {
        let offline = vec![local_track("/in/a.flac", "Artist A", "Album X", "Song 1", "flac", None)];
        let remote = vec![remote_track("artist a", "Album X", "song 1", "mp3", Some(320))];
        let report = compare_libraries(&offline, &remote);

        let mut out = Vec::new();
        write_csv(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(
            lines[0],
            "Artist,Album,Title,Offline Format,Offline Bitrate,Plex Format,Plex Bitrate,Status,Recommendation"
        );
        assert_eq!(
            lines[1],
            "Artist A,Album X,Song 1,flac,,mp3,320,QUALITY_UPGRADE,REPLACE"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_csv_quotes_commas() {
        let offline = vec![local_track("/in/a.mp3", "Earth, Wind & Fire", "B", "C", "mp3", Some(128))];
        let remote = vec![remote_track("Earth, Wind & Fire", "B", "C", "mp3", Some(128))];
        let report = compare_libraries(&offline, &remote);

        let mut out = Vec::new();
        write_csv(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("\"Earth, Wind & Fire\""));
        assert!(text.contains("SAME_QUALITY_DUPLICATE,SKIP"));
    }

    #[test]
    fn test_export_csv_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");

        export_csv(&ComparisonReport::default(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Artist,Album"));
    }
}
