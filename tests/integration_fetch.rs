//! Integration tests for remote image ingestion.
//!
//! Each test stands up a one-shot HTTP server on 127.0.0.1 so no external
//! network access is needed.

mod common;

use common::{png, serve_once, texture, Reply};
use lookalike::core::ingest::{FetchConfig, ImageIngestor, RemoteFetcher};
use lookalike::core::hasher::HasherConfig;
use lookalike::error::{IngestError, LookalikeError};
use std::time::{Duration, Instant};

fn ingestor_with(config: FetchConfig) -> ImageIngestor {
    ImageIngestor::with_parts(
        HasherConfig::default().build().unwrap(),
        RemoteFetcher::new(config).unwrap(),
    )
}

#[test]
fn remote_image_hashes_like_local_bytes() {
    let bytes = png(&texture(0.0, 120, 90));
    let url = serve_once(Reply::Respond("200 OK", bytes.clone()));
    let ingestor = ImageIngestor::new().unwrap();

    let remote = ingestor.from_remote(&format!("{}/product.png", url)).unwrap();
    let local = ingestor.from_bytes(&bytes).unwrap();

    assert_eq!(remote, local);
}

#[test]
fn not_found_is_fetch_failure() {
    let url = format!("{}/missing.jpg", serve_once(Reply::Respond("404 Not Found", Vec::new())));
    let ingestor = ImageIngestor::new().unwrap();

    match ingestor.from_remote(&url) {
        Err(LookalikeError::Ingest(IngestError::FetchFailure { url: reported, reason })) => {
            assert_eq!(reported, url);
            assert!(reason.contains("404"), "reason was {}", reason);
        }
        other => panic!("expected FetchFailure, got {:?}", other),
    }
}

#[test]
fn server_error_is_fetch_failure() {
    let url = serve_once(Reply::Respond("500 Internal Server Error", b"oops".to_vec()));
    let ingestor = ImageIngestor::new().unwrap();

    assert!(matches!(
        ingestor.from_remote(&url),
        Err(LookalikeError::Ingest(IngestError::FetchFailure { .. }))
    ));
}

#[test]
fn slow_host_times_out_without_retry() {
    let url = serve_once(Reply::Stall(Duration::from_secs(5)));
    let ingestor = ImageIngestor::new().unwrap();

    let start = Instant::now();
    let result = ingestor.from_remote_with_timeout(&url, Duration::from_millis(300));

    assert!(matches!(
        result,
        Err(LookalikeError::Ingest(IngestError::FetchFailure { .. }))
    ));
    assert!(
        start.elapsed() < Duration::from_secs(4),
        "fetch should give up at the timeout, took {:?}",
        start.elapsed()
    );
}

#[test]
fn oversized_body_is_rejected() {
    let bytes = png(&texture(1.0, 200, 200));
    let url = serve_once(Reply::Respond("200 OK", bytes));
    let ingestor = ingestor_with(FetchConfig {
        timeout: Duration::from_secs(5),
        max_bytes: 64,
    });

    match ingestor.from_remote(&url) {
        Err(LookalikeError::Ingest(IngestError::FetchFailure { reason, .. })) => {
            assert!(reason.contains("limit"), "reason was {}", reason);
        }
        other => panic!("expected FetchFailure, got {:?}", other),
    }
}

#[test]
fn fetched_text_is_decode_failure() {
    let url = serve_once(Reply::Respond("200 OK", b"<html>not an image</html>".to_vec()));
    let ingestor = ImageIngestor::new().unwrap();

    assert!(matches!(
        ingestor.from_remote(&url),
        Err(LookalikeError::Ingest(IngestError::DecodeFailure { .. }))
    ));
}
