//! Plex Media Server library snapshot.
//!
//! Layered the same way as the MusicBrainz client:
//!
//! ```text
//! client.rs   - HTTP calls, status handling
//! dto.rs      - JSON shapes exactly as Plex returns them
//! adapter.rs  - DTO -> RemoteTrack
//! ```

pub mod adapter;
pub mod client;
pub mod dto;

pub use client::PlexClient;
