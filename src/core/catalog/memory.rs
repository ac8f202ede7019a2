//! In-memory catalog backend for testing and embedding.

use super::{CatalogItem, CatalogStore};
use crate::error::CatalogError;
use std::sync::RwLock;

const LOCATION: &str = "memory";

/// In-memory catalog backend
///
/// Items are kept sorted by id so `list_all` returns catalog order.
/// `None` models a catalog that was never built.
pub struct InMemoryCatalog {
    items: RwLock<Option<Vec<CatalogItem>>>,
}

impl InMemoryCatalog {
    /// Create an empty, available catalog
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Some(Vec::new())),
        }
    }

    /// Create a catalog that reports `CatalogError::Unavailable`
    pub fn unavailable() -> Self {
        Self {
            items: RwLock::new(None),
        }
    }

    /// Create a catalog pre-filled with items. Later duplicates of an id
    /// replace earlier ones.
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut sorted: Vec<CatalogItem> = Vec::new();
        for item in items {
            insert_sorted(&mut sorted, item);
        }

        Self {
            items: RwLock::new(Some(sorted)),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn insert_sorted(items: &mut Vec<CatalogItem>, item: CatalogItem) {
    match items.binary_search_by_key(&item.id, |existing| existing.id) {
        Ok(index) => items[index] = item,
        Err(index) => items.insert(index, item),
    }
}

fn corrupted() -> CatalogError {
    CatalogError::Corrupted {
        location: LOCATION.to_string(),
    }
}

fn unavailable() -> CatalogError {
    CatalogError::Unavailable {
        location: LOCATION.to_string(),
    }
}

impl CatalogStore for InMemoryCatalog {
    fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let items = self.items.read().map_err(|_| corrupted())?;
        items.as_ref().cloned().ok_or_else(unavailable)
    }

    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError> {
        let items = self.items.read().map_err(|_| corrupted())?;
        let items = items.as_ref().ok_or_else(unavailable)?;

        Ok(items
            .binary_search_by_key(&id, |item| item.id)
            .ok()
            .map(|index| items[index].clone()))
    }

    fn upsert(&self, item: CatalogItem) -> Result<(), CatalogError> {
        let mut items = self.items.write().map_err(|_| corrupted())?;

        // Writing to a never-built catalog builds it
        insert_sorted(items.get_or_insert_with(Vec::new), item);
        Ok(())
    }

    fn count(&self) -> Result<usize, CatalogError> {
        let items = self.items.read().map_err(|_| corrupted())?;
        items.as_ref().map(Vec::len).ok_or_else(unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::{Fingerprint, HashAlgorithmKind};

    fn item(id: i64) -> CatalogItem {
        CatalogItem::new(
            id,
            format!("Bag Model #{}", id),
            "Bags",
            format!("https://example.com/{}.jpg", id),
            19.0,
            &Fingerprint::from_u64(id as u64),
            HashAlgorithmKind::Perceptual,
        )
    }

    #[test]
    fn unavailable_catalog_errors() {
        let catalog = InMemoryCatalog::unavailable();

        assert!(matches!(
            catalog.list_all(),
            Err(CatalogError::Unavailable { .. })
        ));
        assert!(matches!(
            catalog.count(),
            Err(CatalogError::Unavailable { .. })
        ));
    }

    #[test]
    fn empty_catalog_lists_nothing() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.list_all().unwrap().is_empty());
    }

    #[test]
    fn with_items_sorts_by_id() {
        let catalog = InMemoryCatalog::with_items(vec![item(5), item(2), item(9)]);

        let ids: Vec<i64> = catalog.list_all().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }

    #[test]
    fn upsert_replaces_same_id() {
        let catalog = InMemoryCatalog::with_items(vec![item(1)]);

        let mut updated = item(1);
        updated.name = "Renamed".to_string();
        catalog.upsert(updated).unwrap();

        assert_eq!(catalog.count().unwrap(), 1);
        assert_eq!(catalog.get(1).unwrap().unwrap().name, "Renamed");
    }

    #[test]
    fn upsert_builds_unavailable_catalog() {
        let catalog = InMemoryCatalog::unavailable();
        catalog.upsert(item(3)).unwrap();

        assert_eq!(catalog.count().unwrap(), 1);
    }

    #[test]
    fn get_missing_returns_none() {
        let catalog = InMemoryCatalog::with_items(vec![item(1)]);
        assert!(catalog.get(2).unwrap().is_none());
    }
}
