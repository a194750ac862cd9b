//! MusicBrainz HTTP client
//!
//! Handles communication with the MusicBrainz web service.
//! See: https://musicbrainz.org/doc/MusicBrainz_API
//!
//! IMPORTANT: MusicBrainz requires a User-Agent header and rate limits to 1 req/sec.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{adapter, dto};
use crate::enrichment::domain::{CanonicalCandidate, EnrichmentError, SearchQuery};

/// User agent string - MusicBrainz requires this
const USER_AGENT: &str = concat!(
    "MusicReconciler/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/music-reconciler)"
);

pub const DEFAULT_BASE_URL: &str = "https://musicbrainz.org/ws/2";

/// Spacing between requests; a little over the documented 1 req/sec.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1100);

/// How many hits to ask for per query
const SEARCH_LIMIT: u32 = 10;

/// MusicBrainz API client
pub struct MusicBrainzClient {
    http_client: reqwest::Client,
    base_url: String,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl MusicBrainzClient {
    /// Create a new client against the public service
    pub fn new() -> Result<Self, EnrichmentError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_REQUEST_INTERVAL)
    }

    /// Create a client with custom base URL and request spacing
    pub fn with_base_url(
        base_url: impl Into<String>,
        request_interval: Duration,
    ) -> Result<Self, EnrichmentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Search recordings and return candidates in MusicBrainz's ranking order
    pub async fn search_recordings(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CanonicalCandidate>, EnrichmentError> {
        let response = self.send_search_request(query).await?;
        Ok(adapter::to_candidates(response))
    }

    /// Wait until the rate limit allows another request
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.request_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Send the HTTP request and parse the response
    async fn send_search_request(
        &self,
        query: &SearchQuery,
    ) -> Result<dto::SearchResponse, EnrichmentError> {
        let lucene = build_lucene_query(query);
        if lucene.is_empty() {
            return Err(EnrichmentError::ApiError("empty search query".to_string()));
        }

        let url = format!(
            "{}/recording?query={}&fmt=json&limit={}",
            self.base_url,
            urlencoding::encode(&lucene),
            SEARCH_LIMIT
        );

        self.throttle().await;
        tracing::debug!(query = %lucene, "MusicBrainz recording search");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        {
            return Err(EnrichmentError::RateLimited);
        }

        if !status.is_success() {
            // Try to parse error response
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(EnrichmentError::ApiError(error.error));
            }
            return Err(EnrichmentError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<dto::SearchResponse>()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))
    }
}

/// Build a Lucene query like `artist:"Queen" AND recording:"Song"`.
pub fn build_lucene_query(query: &SearchQuery) -> String {
    let mut clauses = Vec::new();

    if !query.artist.trim().is_empty() {
        clauses.push(format!("artist:\"{}\"", escape_phrase(&query.artist)));
    }
    if let Some(title) = query.title.as_deref().filter(|t| !t.trim().is_empty()) {
        clauses.push(format!("recording:\"{}\"", escape_phrase(title)));
    }
    if let Some(album) = query.album.as_deref().filter(|a| !a.trim().is_empty()) {
        clauses.push(format!("release:\"{}\"", escape_phrase(album)));
    }

    clauses.join(" AND ")
}

/// Escape characters that are special inside a quoted Lucene phrase.
fn escape_phrase(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
