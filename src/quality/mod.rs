//! Audio quality comparison.
//!
//! Every descriptor maps to a [`QualityRank`]: a format tier followed by the
//! bitrate. Lossless always outranks lossy regardless of bitrate, and within
//! a tier a known bitrate outranks an unknown one.
//!
//! # Tiers
//!
//! - Lossless: flac, alac, wav, aiff, ape, wv, wmalossless, dsd
//! - Lossy: mp3, aac, vorbis, opus, wma
//! - Unknown: anything else
//!
//! The rank is compared through its derived `Ord`, so the ordering is total
//! and transitive by construction.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::model::TrackDescriptor;

/// Formats that decode bit-exact to the source.
const LOSSLESS_FORMATS: &[&str] = &[
    "flac",
    "alac",
    "wav",
    "aiff",
    "ape",
    "wv",
    "wmalossless",
    "dsd",
];

/// Perceptual codecs.
const LOSSY_FORMATS: &[&str] = &["mp3", "aac", "vorbis", "opus", "wma"];

/// Coarse quality bucket, compared before bitrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    Unknown,
    Lossy,
    Lossless,
}

impl QualityTier {
    /// Tier of a normalized format name.
    pub fn of_format(format: &str) -> Self {
        if LOSSLESS_FORMATS.contains(&format) {
            Self::Lossless
        } else if LOSSY_FORMATS.contains(&format) {
            Self::Lossy
        } else {
            Self::Unknown
        }
    }
}

/// Sort key for quality. Derived from a descriptor, never stored.
///
/// `Option<u32>` orders `None` below every `Some`, which is what makes a
/// missing bitrate the lowest within a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualityRank {
    pub tier: QualityTier,
    pub bitrate_kbps: Option<u32>,
}

impl QualityRank {
    pub fn of(descriptor: &TrackDescriptor) -> Self {
        Self {
            tier: QualityTier::of_format(&descriptor.format),
            bitrate_kbps: descriptor.bitrate_kbps,
        }
    }
}

/// Outcome of comparing two descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityComparison {
    SameQuality,
    ABetter,
    BBetter,
}

impl QualityComparison {
    /// The comparison seen from the other side.
    pub fn reversed(self) -> Self {
        match self {
            Self::SameQuality => Self::SameQuality,
            Self::ABetter => Self::BBetter,
            Self::BBetter => Self::ABetter,
        }
    }
}

impl From<Ordering> for QualityComparison {
    fn from(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Equal => Self::SameQuality,
            Ordering::Greater => Self::ABetter,
            Ordering::Less => Self::BBetter,
        }
    }
}

/// Decide which of two descriptors is the higher quality copy.
pub fn compare(a: &TrackDescriptor, b: &TrackDescriptor) -> QualityComparison {
    QualityRank::of(a).cmp(&QualityRank::of(b)).into()
}

/// Short human label like `"flac"` or `"mp3 320kbps"`.
pub fn describe(descriptor: &TrackDescriptor) -> String {
    match descriptor.bitrate_kbps {
        Some(kbps) => format!("{} {}kbps", descriptor.format, kbps),
        None => descriptor.format.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(format: &str, bitrate: Option<u32>) -> TrackDescriptor {
        TrackDescriptor::new("Artist", "Album", "Title", format).with_bitrate(bitrate)
    }

    #[test]
    fn test_lossless_beats_lossy_regardless_of_bitrate() {
        let flac = track("flac", None);
        let mp3 = track("mp3", Some(320));
        assert_eq!(compare(&flac, &mp3), QualityComparison::ABetter);
        assert_eq!(compare(&mp3, &flac), QualityComparison::BBetter);
    }

    #[test]
    fn test_same_tier_compares_bitrate() {
        assert_eq!(
            compare(&track("mp3", Some(320)), &track("aac", Some(256))),
            QualityComparison::ABetter
        );
        assert_eq!(
            compare(&track("mp3", Some(128)), &track("mp3", Some(256))),
            QualityComparison::BBetter
        );
    }

    #[test]
    fn test_missing_bitrate_is_lowest() {
        assert_eq!(
            compare(&track("mp3", None), &track("mp3", Some(96))),
            QualityComparison::BBetter
        );
    }

    #[test]
    fn test_both_missing_bitrate_is_same_quality() {
        assert_eq!(
            compare(&track("flac", None), &track("alac", None)),
            QualityComparison::SameQuality
        );
    }

    #[test]
    fn test_unknown_format_ranks_below_lossy() {
        assert_eq!(
            compare(&track("xyz", Some(999)), &track("mp3", Some(64))),
            QualityComparison::BBetter
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&track("mp3", Some(320))), "mp3 320kbps");
        assert_eq!(describe(&track("flac", None)), "flac");
    }

    #[test]
    fn test_ordering_is_transitive_over_fixed_formats() {
        let formats = ["flac", "alac", "wav", "mp3", "aac", "vorbis", "opus", "xyz"];
        let bitrates = [None, Some(128), Some(256), Some(320), Some(1411)];
        let tracks: Vec<_> = formats
            .iter()
            .flat_map(|f| bitrates.iter().map(move |b| track(f, *b)))
            .collect();

        for a in &tracks {
            for b in &tracks {
                assert_eq!(compare(a, b), compare(b, a).reversed());
                for c in &tracks {
                    if compare(a, b) == QualityComparison::ABetter
                        && compare(b, c) == QualityComparison::ABetter
                    {
                        assert_eq!(compare(a, c), QualityComparison::ABetter);
                    }
                    if compare(a, b) == QualityComparison::SameQuality
                        && compare(b, c) == QualityComparison::SameQuality
                    {
                        assert_eq!(compare(a, c), QualityComparison::SameQuality);
                    }
                }
            }
        }
    }
}
