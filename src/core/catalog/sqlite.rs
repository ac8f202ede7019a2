//! SQLite catalog backend for persistent storage.
//!
//! The schema is the `products` table the catalog builder writes
//! (`id, name, category, price, image_url, phash`) plus an `algorithm`
//! column. Older tables gain the column on open, defaulting to
//! `perceptual`, which is what the builder hashes with.

use super::{CatalogItem, CatalogStore};
use crate::error::CatalogError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const SELECT_COLUMNS: &str =
    "SELECT id, name, category, image_url, price, phash, algorithm FROM products";

const UPSERT: &str = "INSERT OR REPLACE INTO products
     (id, name, category, price, image_url, phash, algorithm)
     VALUES (?, ?, ?, ?, ?, ?, ?)";

/// SQLite-backed persistent catalog
///
/// Uses WAL (Write-Ahead Logging) mode so searches can read while the
/// catalog is being extended.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCatalog {
    /// Open an existing catalog.
    ///
    /// A missing database file, or one without a `products` table, is
    /// reported as `CatalogError::Unavailable` rather than as an empty
    /// catalog.
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::Unavailable {
                location: path.display().to_string(),
            });
        }

        let conn = Connection::open(path).map_err(|e| CatalogError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let has_products: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'products'",
                [],
                |row| row.get::<_, i64>(0).map(|count| count > 0),
            )
            .map_err(|e| CatalogError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if !has_products {
            return Err(CatalogError::Unavailable {
                location: path.display().to_string(),
            });
        }

        ensure_algorithm_column(&conn)?;

        debug!(path = %path.display(), "Opened catalog");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Open a catalog, creating the database and schema if needed
    pub fn create(path: &Path) -> Result<Self, CatalogError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CatalogError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                price REAL NOT NULL,
                image_url TEXT NOT NULL,
                phash TEXT NOT NULL,
                algorithm TEXT NOT NULL DEFAULT 'perceptual'
            )",
            [],
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        ensure_algorithm_column(&conn)?;

        debug!(path = %path.display(), "Created catalog");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    /// Path of the underlying database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::Corrupted {
            location: self.db_path.display().to_string(),
        })
    }

    /// A NULL fingerprint becomes an empty string, which the matcher
    /// reports as malformed instead of failing the whole listing.
    fn row_to_item(row: &Row<'_>) -> rusqlite::Result<CatalogItem> {
        Ok(CatalogItem {
            id: row.get(0)?,
            name: row.get(1)?,
            category: row.get(2)?,
            image_url: row.get(3)?,
            price: row.get(4)?,
            fingerprint: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            algorithm: row.get(6)?,
        })
    }
}

/// Add the `algorithm` column to a table written before it existed
fn ensure_algorithm_column(conn: &Connection) -> Result<(), CatalogError> {
    let present: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('products') WHERE name = 'algorithm'",
            [],
            |row| row.get::<_, i64>(0).map(|count| count > 0),
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

    if !present {
        debug!("Adding algorithm column to products table");
        conn.execute(
            "ALTER TABLE products ADD COLUMN algorithm TEXT NOT NULL DEFAULT 'perceptual'",
            [],
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;
    }

    Ok(())
}

impl CatalogStore for SqliteCatalog {
    fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let conn = self.lock()?;

        // A single SELECT reads from one snapshot of the database.
        let mut stmt = conn
            .prepare(&format!("{} ORDER BY id", SELECT_COLUMNS))
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        let items = stmt
            .query_map([], Self::row_to_item)
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(items)
    }

    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            [id],
            Self::row_to_item,
        )
        .optional()
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))
    }

    fn upsert(&self, item: CatalogItem) -> Result<(), CatalogError> {
        let conn = self.lock()?;

        conn.execute(
            UPSERT,
            params![
                item.id,
                item.name,
                item.category,
                item.price,
                item.image_url,
                item.fingerprint,
                item.algorithm,
            ],
        )
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn upsert_batch(&self, items: &[CatalogItem]) -> Result<(), CatalogError> {
        let mut conn = self.lock()?;

        let tx = conn
            .transaction()
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        {
            let mut stmt = tx
                .prepare(UPSERT)
                .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

            for item in items {
                stmt.execute(params![
                    item.id,
                    item.name,
                    item.category,
                    item.price,
                    item.image_url,
                    item.fingerprint,
                    item.algorithm,
                ])
                .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;
            }
        }

        tx.commit()
            .map_err(|e| CatalogError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    fn count(&self) -> Result<usize, CatalogError> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM products", [], |row| {
            row.get::<_, i64>(0).map(|v| v as usize)
        })
        .map_err(|e| CatalogError::QueryFailed(e.to_string()))
    }
}
