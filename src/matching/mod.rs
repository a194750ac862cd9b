//! Identity matching between local files, the live library and canonical
//! metadata.
//!
//! - [`normalize`] - text normalization shared by every comparison
//! - [`fingerprint`] - exact identity test and 0-100 similarity score
//! - [`automatch`] - scores external search candidates and assigns a
//!   confidence category per file

pub mod automatch;
pub mod fingerprint;
pub mod normalize;

pub use automatch::{AutoMatcher, MatchBatch, MatchCategory, MatchResult, MatchThresholds};
pub use fingerprint::{IdentityKey, matches, same_album, score, title_similarity};
