use std::sync::Arc;

use crate::item::{CatalogItem, ProductId};

/// Read access to the product catalog.
///
/// Implementations normalize upstream records before returning them, so
/// consumers only ever see the canonical [`CatalogItem`]. A product that does
/// not resolve returns `None`; callers decide whether that is a filtered
/// dangling reference (enquiry listing) or a hard error.
pub trait CatalogReader: Send + Sync {
    fn get_item(&self, product_id: ProductId) -> Option<CatalogItem>;
}

impl<C> CatalogReader for Arc<C>
where
    C: CatalogReader + ?Sized,
{
    fn get_item(&self, product_id: ProductId) -> Option<CatalogItem> {
        (**self).get_item(product_id)
    }
}
