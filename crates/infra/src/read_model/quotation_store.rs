use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use quotelink_core::{BuyerId, SellerId};
use quotelink_quotation::{
    ContactSnapshot, ExpiryPolicy, QuotationId, QuotationItem, QuotationStatus, SellerResponse,
};

/// Query-side view of a quotation, maintained by the quotations projection.
///
/// `estimated_total` (the buyer's ask) and `seller_response.quoted_total`
/// (the seller's offer) are distinct fields and are never merged.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotationView {
    pub quotation_id: QuotationId,
    pub buyer_id: BuyerId,
    pub seller_id: Option<SellerId>,
    pub items: Vec<QuotationItem>,
    pub contact: ContactSnapshot,
    pub customer_notes: Option<String>,
    pub estimated_total: f64,
    pub status: QuotationStatus,
    pub seller_response: Option<SellerResponse>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl QuotationView {
    /// Advisory expiry check for display purposes. Reading a view never
    /// mutates status; the actual transition is the `Expire` command.
    pub fn expired_by(&self, policy: &ExpiryPolicy, now: DateTime<Utc>) -> bool {
        self.status == QuotationStatus::Pending && policy.is_past_threshold(self.created_at, now)
    }
}

/// Storage abstraction for quotation views.
///
/// The seller-side listing covers quotations a seller can act on: everything
/// still `Pending` (open to any licensed seller) plus the ones this seller
/// already answered.
pub trait QuotationViewStore: Send + Sync {
    fn get(&self, quotation_id: &QuotationId) -> Option<QuotationView>;
    fn upsert(&self, view: QuotationView);
    fn list_for_buyer(&self, buyer_id: BuyerId) -> Vec<QuotationView>;
    fn list_for_seller(&self, seller_id: SellerId) -> Vec<QuotationView>;
    /// Drop all views (rebuild support).
    fn clear(&self);
}

impl<S> QuotationViewStore for Arc<S>
where
    S: QuotationViewStore + ?Sized,
{
    fn get(&self, quotation_id: &QuotationId) -> Option<QuotationView> {
        (**self).get(quotation_id)
    }

    fn upsert(&self, view: QuotationView) {
        (**self).upsert(view)
    }

    fn list_for_buyer(&self, buyer_id: BuyerId) -> Vec<QuotationView> {
        (**self).list_for_buyer(buyer_id)
    }

    fn list_for_seller(&self, seller_id: SellerId) -> Vec<QuotationView> {
        (**self).list_for_seller(seller_id)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// In-memory quotation view store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryQuotationViewStore {
    inner: RwLock<HashMap<QuotationId, QuotationView>>,
}

impl InMemoryQuotationViewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn list_where(&self, mut keep: impl FnMut(&QuotationView) -> bool) -> Vec<QuotationView> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut views: Vec<QuotationView> = map.values().filter(|v| keep(v)).cloned().collect();
        // Stable listing order: newest first.
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        views
    }
}

impl QuotationViewStore for InMemoryQuotationViewStore {
    fn get(&self, quotation_id: &QuotationId) -> Option<QuotationView> {
        let map = self.inner.read().ok()?;
        map.get(quotation_id).cloned()
    }

    fn upsert(&self, view: QuotationView) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(view.quotation_id, view);
        }
    }

    fn list_for_buyer(&self, buyer_id: BuyerId) -> Vec<QuotationView> {
        self.list_where(|v| v.buyer_id == buyer_id)
    }

    fn list_for_seller(&self, seller_id: SellerId) -> Vec<QuotationView> {
        self.list_where(|v| {
            v.status == QuotationStatus::Pending || v.seller_id == Some(seller_id)
        })
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}
