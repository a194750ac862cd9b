//! Canonical-metadata search - finds authoritative artist/album/title data
//! for locally scanned files.
//!
//! # Architecture
//!
//! This module follows a clean separation between:
//! - **Domain models** (`domain.rs`) - Internal types that represent our business logic
//! - **API DTOs** (`musicbrainz/dto.rs`) - Exact API response shapes
//! - **Adapters** - Convert DTOs to domain models
//! - **Clients** - HTTP clients for external APIs
//! - **Traits** (`traits.rs`) - The search seam the auto-matcher depends on
//!
//! This decoupling means:
//! 1. API changes don't ripple through our codebase
//! 2. We can test API contracts independently
//! 3. The matcher is tested against mocks, never the network
//!
//! # Usage
//!
//! ```ignore
//! use enrichment::{CanonicalSearch, MusicBrainzClient, SearchQuery};
//!
//! let client = MusicBrainzClient::new()?;
//! let query = SearchQuery::from_descriptor(&track.metadata).unwrap();
//! let candidates = client.search(&query).await?;
//! ```

pub mod domain;
pub mod musicbrainz;
pub mod traits;

pub use domain::{CanonicalCandidate, EnrichmentError, EnrichmentSource, SearchQuery};
pub use musicbrainz::MusicBrainzClient;
pub use traits::CanonicalSearch;
