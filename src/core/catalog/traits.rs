//! Catalog backend trait definition.

use super::CatalogItem;
use crate::error::CatalogError;

/// Trait for catalog backends
///
/// The matcher only ever reads through `list_all`; the other methods exist
/// for whoever builds and inspects the catalog.
pub trait CatalogStore: Send + Sync {
    /// Return every item as one consistent snapshot, in catalog order
    /// (ascending id).
    ///
    /// Fails with `CatalogError::Unavailable` when the catalog has not been
    /// built, which is distinct from returning an empty vector.
    fn list_all(&self) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Look up a single item
    fn get(&self, id: i64) -> Result<Option<CatalogItem>, CatalogError>;

    /// Insert an item, replacing any existing item with the same id
    fn upsert(&self, item: CatalogItem) -> Result<(), CatalogError>;

    /// Insert several items in one go.
    fn upsert_batch(&self, items: &[CatalogItem]) -> Result<(), CatalogError> {
        for item in items {
            self.upsert(item.clone())?;
        }
        Ok(())
    }

    /// Number of items in the catalog
    fn count(&self) -> Result<usize, CatalogError>;
}
