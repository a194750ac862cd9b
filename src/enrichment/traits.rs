//! Trait definitions for external API clients.
//!
//! These traits enable dependency injection and mocking for tests.
//! Production code uses the real client implementations, while tests
//! can substitute mock implementations.
//!
//! # Example
//!
//! ```ignore
//! use music_reconciler::enrichment::traits::CanonicalSearch;
//!
//! async fn best<S: CanonicalSearch>(search: &S, query: &SearchQuery) {
//!     let candidates = search.search(query).await?;
//! }
//! ```

use async_trait::async_trait;

use super::domain::{CanonicalCandidate, EnrichmentError, SearchQuery};

/// Canonical-metadata search (MusicBrainz in production).
///
/// Returns zero or more candidates ranked by the provider. A failure applies
/// to this query only; callers keep going with the next one.
#[async_trait]
pub trait CanonicalSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery)
    -> Result<Vec<CanonicalCandidate>, EnrichmentError>;
}

#[async_trait]
impl CanonicalSearch for super::musicbrainz::MusicBrainzClient {
    async fn search(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CanonicalCandidate>, EnrichmentError> {
        self.search_recordings(query).await
    }
}

/// Mock search clients for testing.
#[cfg(test)]
pub mod mocks {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Returns the same candidates for every query.
    pub struct MockSearch {
        pub results: Vec<CanonicalCandidate>,
        /// Error to return (takes precedence over results)
        pub error: Option<EnrichmentError>,
        /// Queries received, in order
        pub calls: Mutex<Vec<SearchQuery>>,
    }

    impl MockSearch {
        /// Create a mock that returns no candidates.
        pub fn no_matches() -> Self {
            Self::with_results(vec![])
        }

        pub fn with_results(results: Vec<CanonicalCandidate>) -> Self {
            Self {
                results,
                error: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Create a mock that fails every query.
        pub fn with_error(error: EnrichmentError) -> Self {
            Self {
                results: vec![],
                error: Some(error),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl CanonicalSearch for MockSearch {
        async fn search(
            &self,
            query: &SearchQuery,
        ) -> Result<Vec<CanonicalCandidate>, EnrichmentError> {
            self.calls.lock().push(query.clone());
            if let Some(ref err) = self.error {
                return Err(err.clone());
            }
            Ok(self.results.clone())
        }
    }

    /// Answers per title; titles without an entry fail with a network error.
    #[derive(Default)]
    pub struct ScriptedSearch {
        pub by_title: HashMap<String, Vec<CanonicalCandidate>>,
    }

    impl ScriptedSearch {
        pub fn answer(mut self, title: &str, candidates: Vec<CanonicalCandidate>) -> Self {
            self.by_title.insert(title.to_string(), candidates);
            self
        }
    }

    #[async_trait]
    impl CanonicalSearch for ScriptedSearch {
        async fn search(
            &self,
            query: &SearchQuery,
        ) -> Result<Vec<CanonicalCandidate>, EnrichmentError> {
            let title = query.title.clone().unwrap_or_default();
            self.by_title
                .get(&title)
                .cloned()
                .ok_or_else(|| EnrichmentError::Network(format!("timeout searching {}", title)))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn query() -> SearchQuery {
            SearchQuery {
                artist: "Artist".to_string(),
                album: None,
                title: Some("Song".to_string()),
            }
        }

        #[tokio::test]
        async fn test_mock_search_no_matches() {
            let mock = MockSearch::no_matches();
            let results = mock.search(&query()).await.unwrap();
            assert!(results.is_empty());
            assert_eq!(mock.call_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_search_error() {
            let mock = MockSearch::with_error(EnrichmentError::Network("timeout".to_string()));
            let result = mock.search(&query()).await;
            assert!(matches!(result, Err(EnrichmentError::Network(_))));
        }

        #[tokio::test]
        async fn test_scripted_search() {
            let mock = ScriptedSearch::default()
                .answer("Song", vec![CanonicalCandidate::new("Artist", None, "Song", 100)]);
            assert_eq!(mock.search(&query()).await.unwrap().len(), 1);

            let other = SearchQuery {
                title: Some("Other".to_string()),
                ..query()
            };
            assert!(mock.search(&other).await.is_err());
        }
    }
}
