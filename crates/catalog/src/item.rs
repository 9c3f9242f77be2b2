use serde::{Deserialize, Serialize};

use quotelink_core::AggregateId;

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Structured pricing block found on newer catalog records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawPricing {
    pub selling_price: Option<f64>,
    pub mrp: Option<f64>,
    pub discount_percent: Option<f64>,
}

/// A catalog record as received from the upstream catalog service.
///
/// Upstream records are heterogeneous: newer ones carry a structured
/// `pricing` block, older ones a flat `price`/`original_price` pair, and some
/// carry no price at all. This shape exists only to be normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCatalogRecord {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub pricing: Option<RawPricing>,
    /// Legacy flat selling price, superseded by `pricing.selling_price`.
    #[serde(default)]
    pub price: Option<f64>,
    /// Legacy flat list price (MRP), superseded by `pricing.mrp`.
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub available_quantity: u32,
}

/// Canonical catalog item: the only product shape the pricing engine and the
/// enquiry/quotation services ever see.
///
/// Prices are optional: an item with no resolvable price is still listable
/// and quotable (the pricing engine treats a missing price as zero and
/// reports it so callers can log the degradation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    /// Effective unit selling price.
    pub unit_price: Option<f64>,
    /// List price (MRP). When present, `unit_price <= list_price` holds.
    pub list_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub available_quantity: u32,
}

impl RawCatalogRecord {
    /// Normalize any upstream shape into the canonical [`CatalogItem`].
    ///
    /// Resolution order for the unit price: structured `pricing.selling_price`
    /// first, then the legacy flat `price`. Same for the list price with
    /// `pricing.mrp` and `original_price`. A list price below the resolved
    /// unit price is dropped rather than surfaced, since it would violate the
    /// catalog invariant (selling price <= MRP).
    pub fn normalize(self) -> CatalogItem {
        let structured = self.pricing.unwrap_or_default();

        let unit_price = structured.selling_price.or(self.price);
        let list_price = structured.mrp.or(self.original_price);

        let list_price = match (unit_price, list_price) {
            (Some(unit), Some(list)) if list < unit => None,
            (_, list) => list,
        };

        CatalogItem {
            id: self.id,
            name: self.name,
            unit_price,
            list_price,
            discount_percent: structured.discount_percent,
            available_quantity: self.available_quantity,
        }
    }
}
