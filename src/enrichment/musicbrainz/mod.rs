//! MusicBrainz API integration
//!
//! Searches recordings by artist, album and title and turns the hits into
//! canonical candidates for auto-matching.
//!
//! API docs: https://musicbrainz.org/doc/MusicBrainz_API

pub mod dto;
mod adapter;
mod client;

pub use adapter::{to_candidate, to_candidates};
pub use client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_INTERVAL, MusicBrainzClient, build_lucene_query};
