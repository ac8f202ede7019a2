//! Integration tests for the search engine.
//!
//! These tests verify end-to-end search behavior against a SQLite catalog:
//! - Ranking and the score floor
//! - Corrupt catalog rows
//! - Missing catalogs
//! - Query images that do not decode

mod common;

use common::{encode, png, texture};
use image::ImageFormat;
use lookalike::core::catalog::{CatalogItem, CatalogStore, SqliteCatalog};
use lookalike::core::hasher::{Fingerprint, HashAlgorithmKind};
use lookalike::core::ingest::{ImageIngestor, ImageSource};
use lookalike::core::matcher::QueryParams;
use lookalike::core::search::{SearchEngine, SearchRequest};
use lookalike::error::{CatalogError, IngestError, LookalikeError, QueryError};
use rusqlite::Connection;
use std::path::Path;
use tempfile::TempDir;

fn item(id: i64, fingerprint: &str) -> CatalogItem {
    CatalogItem {
        id,
        name: format!("Product {}", id),
        category: "Test".to_string(),
        image_url: format!("https://example.com/{}.jpg", id),
        price: 9.99,
        fingerprint: fingerprint.to_string(),
        algorithm: "perceptual".to_string(),
    }
}

fn engine_for(path: &Path) -> SearchEngine {
    SearchEngine::builder()
        .catalog(Box::new(SqliteCatalog::open(path).unwrap()))
        .build()
        .unwrap()
}

#[test]
fn search_finds_resized_copy_of_catalog_image() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");
    let ingestor = ImageIngestor::new().unwrap();

    let catalog = SqliteCatalog::create(&db_path).unwrap();
    for (id, seed) in [(1, 0.0), (2, 7.0), (3, 21.0)] {
        let fingerprint = ingestor.from_bytes(&png(&texture(seed, 256, 256))).unwrap();
        catalog
            .upsert(CatalogItem::new(
                id,
                format!("Print {}", id),
                "Art",
                "",
                30.0,
                &fingerprint,
                HashAlgorithmKind::Perceptual,
            ))
            .unwrap();
    }
    drop(catalog);

    // Same picture, smaller and re-encoded as JPEG
    let query = encode(&texture(7.0, 128, 128), ImageFormat::Jpeg);
    let result = engine_for(&db_path)
        .search(&SearchRequest::with_defaults(query))
        .unwrap();

    assert_eq!(result.catalog_size, 3);
    assert_eq!(result.matches[0].item.id, 2);
    assert!(result.matches[0].score >= 85, "score was {}", result.matches[0].score);
}

#[test]
fn scores_and_floor_follow_linear_mapping() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");
    let ingestor = ImageIngestor::new().unwrap();
    let query_bytes = png(&texture(3.0, 64, 64));
    let query = ingestor.from_bytes(&query_bytes).unwrap();
    let query_bits = query.as_u64().unwrap();

    // Flip 0, 8 and 40 bits of the query fingerprint
    let catalog = SqliteCatalog::create(&db_path).unwrap();
    catalog
        .upsert_batch(&[
            item(1, &Fingerprint::from_u64(query_bits ^ ((1u64 << 40) - 1)).to_hex()),
            item(2, &Fingerprint::from_u64(query_bits ^ 0xFF).to_hex()),
            item(3, &query.to_hex()),
        ])
        .unwrap();
    drop(catalog);

    let engine = engine_for(&db_path);

    let all = engine
        .search(&SearchRequest::new(
            query_bytes.clone(),
            QueryParams::new(0, 24).unwrap(),
        ))
        .unwrap();
    let scored: Vec<(i64, u8)> = all.matches.iter().map(|m| (m.item.id, m.score)).collect();
    assert_eq!(scored, vec![(3, 100), (2, 88), (1, 38)]);

    let strict = engine
        .search(&SearchRequest::new(query_bytes, QueryParams::new(80, 24).unwrap()))
        .unwrap();
    let ids: Vec<i64> = strict.matches.iter().map(|m| m.item.id).collect();
    assert_eq!(ids, vec![3, 2]);
    assert_eq!(strict.ranked_count, 3);
}

#[test]
fn corrupt_rows_are_skipped_and_counted() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");

    let catalog = SqliteCatalog::create(&db_path).unwrap();
    catalog
        .upsert_batch(&[
            item(1, "0000000000000000"),
            item(2, "not-hex!"),
            item(3, "abc"),
            item(4, "ffffffffffffffff"),
        ])
        .unwrap();
    drop(catalog);

    let result = engine_for(&db_path)
        .search(&SearchRequest::new(
            png(&texture(0.0, 64, 64)),
            QueryParams::new(0, 24).unwrap(),
        ))
        .unwrap();

    let ids: Vec<i64> = result.skipped.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(result.matches.len(), 2);
}

#[test]
fn missing_catalog_is_unavailable_not_empty() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("never-built.db");

    let result = SqliteCatalog::open(&db_path);

    assert!(matches!(result, Err(CatalogError::Unavailable { .. })));
    let error = LookalikeError::from(result.err().unwrap());
    assert!(error.user_message().contains("lookalike add"));
}

#[test]
fn reads_catalog_written_by_other_tools() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");

    let conn = Connection::open(&db_path).unwrap();
    conn.execute_batch(
        "CREATE TABLE products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            price REAL NOT NULL,
            image_url TEXT NOT NULL,
            phash TEXT NOT NULL
        );
        INSERT INTO products (name, category, price, image_url, phash)
        VALUES ('Classic Watch', 'Watches', 129.0, 'https://example.com/w.jpg', '0000000000000000'),
               ('Leather Bag', 'Bags', 89.5, 'https://example.com/b.jpg', 'FFFFFFFFFFFFFFFF');",
    )
    .unwrap();
    drop(conn);

    let catalog = SqliteCatalog::open(&db_path).unwrap();
    let items = catalog.list_all().unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Classic Watch");
    assert_eq!(items[0].algorithm, "perceptual");
    assert_eq!(items[1].decode_fingerprint().unwrap().as_u64(), Some(u64::MAX));
}

#[test]
fn catalog_records_the_algorithm_each_entry_was_hashed_with() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");
    let image = png(&texture(6.0, 128, 128));

    let catalog = SqliteCatalog::create(&db_path).unwrap();
    let phash = ImageIngestor::new().unwrap();
    catalog
        .upsert(CatalogItem::new(
            1,
            "Vase",
            "Home",
            "",
            12.0,
            &phash.from_bytes(&image).unwrap(),
            HashAlgorithmKind::Perceptual,
        ))
        .unwrap();
    drop(catalog);

    let dhash_engine = SearchEngine::builder()
        .algorithm(HashAlgorithmKind::Difference)
        .catalog(Box::new(SqliteCatalog::open(&db_path).unwrap()))
        .build()
        .unwrap();
    let mismatched = dhash_engine
        .search(&SearchRequest::new(image.clone(), QueryParams::new(0, 24).unwrap()))
        .unwrap();
    assert!(mismatched.matches.is_empty());
    assert_eq!(mismatched.skipped.len(), 1);

    let matched = engine_for(&db_path)
        .search(&SearchRequest::with_defaults(image))
        .unwrap();
    assert_eq!(matched.matches[0].score, 100);
}

#[test]
fn undecodable_query_fails_only_that_query() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("products.db");
    SqliteCatalog::create(&db_path)
        .unwrap()
        .upsert(item(1, "0000000000000000"))
        .unwrap();

    let engine = engine_for(&db_path);
    let text_file = temp_dir.path().join("notes.txt");
    std::fs::write(&text_file, "just some words").unwrap();

    let results = engine
        .search_many(&[
            SearchRequest::with_defaults(ImageSource::Path(text_file)),
            SearchRequest::with_defaults(png(&texture(0.0, 64, 64))),
        ])
        .unwrap();

    assert!(matches!(
        results[0],
        Err(LookalikeError::Ingest(IngestError::DecodeFailure { .. }))
    ));
    assert!(results[1].is_ok());
}

#[test]
fn invalid_parameters_are_rejected_up_front() {
    assert!(matches!(
        QueryParams::new(150, 24),
        Err(QueryError::InvalidParameter {
            name: "min_score",
            value: 150,
            ..
        })
    ));
    assert!(matches!(
        QueryParams::new(50, -3),
        Err(QueryError::InvalidParameter {
            name: "max_results",
            ..
        })
    ));
}
