//! Plex Media Server HTTP client
//!
//! Reads the music library snapshot the comparator and move planner work
//! against. The token is taken from config or the environment; no sign-in
//! flow is performed.

use std::time::Duration;

use super::{adapter, dto};
use crate::enrichment::EnrichmentError;
use crate::model::RemoteTrack;

/// Plex `type` filter for tracks
const TRACK_TYPE: u32 = 10;

/// Plex API client
pub struct PlexClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PlexClient {
    /// Create a client for a server URL and token.
    pub fn new(base_url: &str, token: &str) -> Result<Self, EnrichmentError> {
        if base_url.trim().is_empty() {
            return Err(EnrichmentError::NotConfigured("plex.url".to_string()));
        }
        if token.trim().is_empty() {
            return Err(EnrichmentError::NotConfigured("plex.token".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        })
    }

    /// Every track in a library section.
    pub async fn fetch_tracks(&self, section_id: &str) -> Result<Vec<RemoteTrack>, EnrichmentError> {
        let url = tracks_url(&self.base_url, section_id);
        tracing::info!(section = section_id, "Fetching Plex library snapshot");

        let response: dto::TracksResponse = self.get_json(&url).await?;
        let tracks = adapter::to_remote_tracks(response);

        tracing::info!(tracks = tracks.len(), "Plex snapshot fetched");
        Ok(tracks)
    }

    /// `(key, title)` of every music section on the server.
    pub async fn music_sections(&self) -> Result<Vec<(String, String)>, EnrichmentError> {
        let url = format!("{}/library/sections", self.base_url);
        let response: dto::SectionsResponse = self.get_json(&url).await?;
        Ok(adapter::music_sections(response))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, EnrichmentError> {
        let response = self
            .http_client
            .get(url)
            .header("X-Plex-Token", &self.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(EnrichmentError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(EnrichmentError::RateLimited);
        }

        if !status.is_success() {
            return Err(EnrichmentError::ApiError(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))
    }
}

/// Track listing URL for a section.
pub fn tracks_url(base_url: &str, section_id: &str) -> String {
    format!(
        "{}/library/sections/{}/all?type={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(section_id),
        TRACK_TYPE
    )
}
