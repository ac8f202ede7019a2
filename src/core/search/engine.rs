//! Search engine implementation.

use crate::core::catalog::{CatalogItem, CatalogStore, InMemoryCatalog};
use crate::core::hasher::{Fingerprint, HashAlgorithmKind, HasherConfig};
use crate::core::ingest::{
    FetchConfig, ImageIngestor, ImageSource, RemoteFetcher, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_MAX_DOWNLOAD_BYTES,
};
use crate::core::matcher::{
    apply_min_score, LinearScan, QueryParams, ScoredMatch, SimilaritySearch, SkippedEntry,
};
use crate::error::LookalikeError;
use crate::events::{null_sender, Event, EventSender, SearchEvent, SearchPhase, SearchSummary};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// One visual search query
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// The query image
    pub source: ImageSource,
    /// Score floor and result cap
    pub params: QueryParams,
}

impl SearchRequest {
    pub fn new(source: impl Into<ImageSource>, params: QueryParams) -> Self {
        Self {
            source: source.into(),
            params,
        }
    }

    /// Query with the default parameters (min score 50, 24 results)
    pub fn with_defaults(source: impl Into<ImageSource>) -> Self {
        Self::new(source, QueryParams::default())
    }
}

/// Result of a visual search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    /// Id shared with this search's events
    pub query_id: Uuid,
    /// Fingerprint of the query image
    pub query_fingerprint: Fingerprint,
    /// Algorithm the query was hashed with
    pub algorithm: HashAlgorithmKind,
    /// Matches at or above the score floor, best first
    pub matches: Vec<ScoredMatch>,
    /// Matches after ranking, before the score floor
    pub ranked_count: usize,
    /// Items in the catalog snapshot
    pub catalog_size: usize,
    /// Catalog entries that could not be scored
    pub skipped: Vec<SkippedEntry>,
    /// When the search finished
    pub searched_at: DateTime<Utc>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the search engine
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Hash algorithm used for query images; only catalog entries tagged
    /// with the same algorithm are scored
    pub algorithm: HashAlgorithmKind,
    /// Hash grid size (8 gives the 64-bit fingerprints catalogs store)
    pub hash_size: u32,
    /// Timeout for remote query images
    pub fetch_timeout: Duration,
    /// Largest remote image accepted
    pub max_download_bytes: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithmKind::Perceptual,
            hash_size: 8,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
        }
    }
}

/// Builder for search engine configuration
pub struct SearchEngineBuilder {
    config: SearchConfig,
    catalog: Option<Box<dyn CatalogStore>>,
}

impl SearchEngineBuilder {
    /// Create a new search engine builder
    pub fn new() -> Self {
        Self {
            config: SearchConfig::default(),
            catalog: None,
        }
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Set the hash size (8, 16, or 32)
    pub fn hash_size(mut self, size: u32) -> Self {
        self.config.hash_size = size;
        self
    }

    /// Set the remote fetch timeout
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch_timeout = timeout;
        self
    }

    /// Set the download size limit
    pub fn max_download_bytes(mut self, bytes: u64) -> Self {
        self.config.max_download_bytes = bytes;
        self
    }

    /// Set the catalog to search
    pub fn catalog(mut self, catalog: Box<dyn CatalogStore>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the engine.
    ///
    /// Without a catalog every search fails with `CatalogError::Unavailable`.
    pub fn build(self) -> Result<SearchEngine, LookalikeError> {
        let hasher = HasherConfig::new()
            .algorithm(self.config.algorithm)
            .hash_size(self.config.hash_size)
            .build()?;

        let fetcher = RemoteFetcher::new(FetchConfig {
            timeout: self.config.fetch_timeout,
            max_bytes: self.config.max_download_bytes,
        })?;

        Ok(SearchEngine {
            config: self.config,
            catalog: self
                .catalog
                .unwrap_or_else(|| Box::new(InMemoryCatalog::unavailable())),
            ingestor: ImageIngestor::with_parts(hasher, fetcher),
        })
    }
}

impl Default for SearchEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Answers visual search queries against a catalog
pub struct SearchEngine {
    config: SearchConfig,
    catalog: Box<dyn CatalogStore>,
    ingestor: ImageIngestor,
}

impl SearchEngine {
    /// Create a new search engine builder
    pub fn builder() -> SearchEngineBuilder {
        SearchEngineBuilder::new()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The ingestor used for query images
    pub fn ingestor(&self) -> &ImageIngestor {
        &self.ingestor
    }

    /// Run one search without events
    pub fn search(&self, request: &SearchRequest) -> Result<SearchResult, LookalikeError> {
        self.search_with_events(request, &null_sender())
    }

    /// Run one search with event reporting.
    ///
    /// The catalog snapshot is taken before the query image is ingested, so
    /// an unbuilt catalog fails fast without downloading anything.
    pub fn search_with_events(
        &self,
        request: &SearchRequest,
        events: &EventSender,
    ) -> Result<SearchResult, LookalikeError> {
        let query_id = Uuid::new_v4();
        events.send(Event::Search(SearchEvent::Started { query_id }));
        events.send(Event::Search(SearchEvent::PhaseChanged {
            query_id,
            phase: SearchPhase::LoadingCatalog,
        }));

        let result = self
            .load_snapshot()
            .and_then(|snapshot| self.search_snapshot(query_id, request, &snapshot, events));

        report_failure(query_id, &result, events);
        result
    }

    /// Run independent searches in parallel against one catalog snapshot.
    ///
    /// The outer error is a catalog failure shared by every query; each
    /// query otherwise succeeds or fails on its own. Results come back in
    /// request order.
    pub fn search_many(
        &self,
        requests: &[SearchRequest],
    ) -> Result<Vec<Result<SearchResult, LookalikeError>>, LookalikeError> {
        self.search_many_with_events(requests, &null_sender())
    }

    /// [`SearchEngine::search_many`] with event reporting
    pub fn search_many_with_events(
        &self,
        requests: &[SearchRequest],
        events: &EventSender,
    ) -> Result<Vec<Result<SearchResult, LookalikeError>>, LookalikeError> {
        let snapshot = self.load_snapshot()?;

        debug!(
            queries = requests.len(),
            catalog_size = snapshot.len(),
            "Running batch search"
        );

        Ok(requests
            .par_iter()
            .map(|request| {
                let query_id = Uuid::new_v4();
                events.send(Event::Search(SearchEvent::Started { query_id }));

                let result = self.search_snapshot(query_id, request, &snapshot, events);
                report_failure(query_id, &result, events);
                result
            })
            .collect())
    }

    fn load_snapshot(&self) -> Result<Vec<CatalogItem>, LookalikeError> {
        let snapshot = self.catalog.list_all()?;
        debug!(items = snapshot.len(), "Loaded catalog snapshot");
        Ok(snapshot)
    }

    fn search_snapshot(
        &self,
        query_id: Uuid,
        request: &SearchRequest,
        snapshot: &[CatalogItem],
        events: &EventSender,
    ) -> Result<SearchResult, LookalikeError> {
        let start_time = Instant::now();
        let phase = |phase| {
            events.send(Event::Search(SearchEvent::PhaseChanged { query_id, phase }));
        };

        phase(SearchPhase::Ingesting);
        let fingerprint = self.ingestor.ingest_with_events(&request.source, events)?;

        phase(SearchPhase::Matching);
        let algorithm = self.config.algorithm;
        let outcome = LinearScan::new(snapshot).find_similar_with_events(
            &fingerprint,
            algorithm,
            request.params.max_results(),
            events,
        );
        let ranked_count = outcome.matches.len();

        phase(SearchPhase::Filtering);
        let matches = apply_min_score(outcome.matches, request.params.min_score());

        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            %query_id,
            query = %fingerprint,
            %algorithm,
            catalog_size = snapshot.len(),
            ranked = ranked_count,
            returned = matches.len(),
            skipped = outcome.skipped.len(),
            duration_ms,
            "Search complete"
        );

        events.send(Event::Search(SearchEvent::Completed {
            summary: SearchSummary {
                query_id,
                catalog_size: snapshot.len(),
                ranked: ranked_count,
                returned: matches.len(),
                skipped: outcome.skipped.len(),
                duration_ms,
            },
        }));

        Ok(SearchResult {
            query_id,
            query_fingerprint: fingerprint,
            algorithm,
            matches,
            ranked_count,
            catalog_size: snapshot.len(),
            skipped: outcome.skipped,
            searched_at: Utc::now(),
            duration_ms,
        })
    }
}

fn report_failure(
    query_id: Uuid,
    result: &Result<SearchResult, LookalikeError>,
    events: &EventSender,
) {
    if let Err(e) = result {
        debug!(%query_id, error = %e, "Search failed");
        events.send(Event::Search(SearchEvent::Failed {
            query_id,
            message: e.user_message(),
        }));
    }
}
