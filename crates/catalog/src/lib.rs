//! Product catalog boundary.
//!
//! The rest of the system only ever sees the canonical [`CatalogItem`];
//! heterogeneous upstream record shapes are normalized here and nowhere else.

pub mod item;
pub mod reader;

pub use item::{CatalogItem, ProductId, RawCatalogRecord, RawPricing};
pub use reader::CatalogReader;
