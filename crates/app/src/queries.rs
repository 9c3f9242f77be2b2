//! Read-side access to quotation views.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use quotelink_core::{BuyerId, DomainError, SellerId};
use quotelink_infra::read_model::{QuotationView, QuotationViewStore};
use quotelink_quotation::{ExpiryPolicy, QuotationId};

/// Read-only quotation queries.
///
/// Reads never mutate status. Expiry surfaced here is advisory
/// (display-only); the actual transition is the scheduler-driven `expire`
/// command on the write side.
pub struct QuotationQueries {
    views: Arc<dyn QuotationViewStore>,
    expiry_policy: ExpiryPolicy,
}

impl QuotationQueries {
    pub fn new(views: Arc<dyn QuotationViewStore>, expiry_policy: ExpiryPolicy) -> Self {
        Self {
            views,
            expiry_policy,
        }
    }

    pub fn list_for_buyer(&self, buyer_id: BuyerId) -> Vec<QuotationView> {
        self.views.list_for_buyer(buyer_id)
    }

    /// Quotations a seller can act on: everything still pending plus the
    /// ones this seller already answered.
    pub fn list_for_seller(&self, seller_id: SellerId) -> Vec<QuotationView> {
        self.views.list_for_seller(seller_id)
    }

    pub fn get_by_id(&self, quotation_id: &QuotationId) -> Result<QuotationView, DomainError> {
        self.views.get(quotation_id).ok_or(DomainError::NotFound)
    }

    /// Advisory expiry for display: pending and past the configured age.
    pub fn advisory_expired(&self, view: &QuotationView, now: DateTime<Utc>) -> bool {
        view.expired_by(&self.expiry_policy, now)
    }
}
