//! In-memory catalog adapter.
//!
//! Backs the [`CatalogReader`] boundary for tests/dev. Items can be removed
//! after enquiry entries reference them, which is how dangling product
//! references are simulated.

use std::collections::HashMap;
use std::sync::RwLock;

use quotelink_catalog::{CatalogItem, CatalogReader, ProductId};

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ProductId, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, item: CatalogItem) {
        if let Ok(mut items) = self.items.write() {
            items.insert(item.id, item);
        }
    }

    pub fn remove(&self, product_id: ProductId) {
        if let Ok(mut items) = self.items.write() {
            items.remove(&product_id);
        }
    }
}

impl CatalogReader for InMemoryCatalog {
    fn get_item(&self, product_id: ProductId) -> Option<CatalogItem> {
        let items = self.items.read().ok()?;
        items.get(&product_id).cloned()
    }
}
