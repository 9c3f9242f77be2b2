use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use quotelink_core::{AggregateId, BuyerId};
use quotelink_events::EventEnvelope;
use quotelink_quotation::{QuotationEvent, QuotationStatus, SellerResponse};

use crate::read_model::{QuotationView, QuotationViewStore};

pub const QUOTATION_AGGREGATE_TYPE: &str = "quotation";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    buyer_id: BuyerId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum QuotationProjectionError {
    #[error("failed to deserialize quotation event: {0}")]
    Deserialize(String),
    #[error("owner isolation violation: {0}")]
    OwnerIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("event out of order: {0}")]
    OutOfOrder(String),
}

/// Builds [`QuotationView`]s from quotation events.
///
/// Tracks a cursor (last processed sequence number) per stream, so
/// re-delivered envelopes are ignored and gaps are detected.
#[derive(Debug)]
pub struct QuotationsProjection<S>
where
    S: QuotationViewStore,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> QuotationsProjection<S>
where
    S: QuotationViewStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, key: CursorKey) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&key).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, key: CursorKey, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(key, seq);
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), QuotationProjectionError> {
        if envelope.aggregate_type() != QUOTATION_AGGREGATE_TYPE {
            return Ok(());
        }

        let buyer_id = envelope.buyer_id();
        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();
        let key = CursorKey {
            buyer_id,
            aggregate_id,
        };

        let last = self.get_cursor(key);
        if seq == 0 {
            return Err(QuotationProjectionError::NonMonotonicSequence { last, found: seq });
        }
        // Already processed: idempotent under at-least-once delivery.
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(QuotationProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: QuotationEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| QuotationProjectionError::Deserialize(e.to_string()))?;

        let (event_buyer, quotation_id) = match &ev {
            QuotationEvent::QuotationSubmitted(e) => (e.buyer_id, e.quotation_id),
            QuotationEvent::SellerResponded(e) => (e.buyer_id, e.quotation_id),
            QuotationEvent::QuotationCancelled(e) => (e.buyer_id, e.quotation_id),
            QuotationEvent::QuotationExpired(e) => (e.buyer_id, e.quotation_id),
        };

        if event_buyer != buyer_id {
            return Err(QuotationProjectionError::OwnerIsolation(
                "event buyer_id does not match envelope buyer_id".to_string(),
            ));
        }
        if quotation_id.0 != aggregate_id {
            return Err(QuotationProjectionError::OwnerIsolation(
                "event quotation_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            QuotationEvent::QuotationSubmitted(e) => {
                self.store.upsert(QuotationView {
                    quotation_id: e.quotation_id,
                    buyer_id: e.buyer_id,
                    seller_id: None,
                    items: e.items,
                    contact: e.contact,
                    customer_notes: e.customer_notes,
                    estimated_total: e.estimated_total,
                    status: QuotationStatus::Pending,
                    seller_response: None,
                    created_at: e.occurred_at,
                    responded_at: None,
                });
            }
            QuotationEvent::SellerResponded(e) => {
                let mut view = self.store.get(&e.quotation_id).ok_or_else(|| {
                    QuotationProjectionError::OutOfOrder(format!(
                        "seller response for unknown quotation {}",
                        e.quotation_id
                    ))
                })?;
                view.seller_id = Some(e.seller_id);
                view.seller_response = Some(SellerResponse {
                    quoted_total: e.quoted_total,
                    notes: e.notes,
                    valid_until: e.valid_until,
                });
                view.responded_at = Some(e.occurred_at);
                view.status = QuotationStatus::Responded;
                self.store.upsert(view);
            }
            QuotationEvent::QuotationCancelled(e) => {
                let mut view = self.store.get(&e.quotation_id).ok_or_else(|| {
                    QuotationProjectionError::OutOfOrder(format!(
                        "cancellation for unknown quotation {}",
                        e.quotation_id
                    ))
                })?;
                view.status = QuotationStatus::Cancelled;
                self.store.upsert(view);
            }
            QuotationEvent::QuotationExpired(e) => {
                let mut view = self.store.get(&e.quotation_id).ok_or_else(|| {
                    QuotationProjectionError::OutOfOrder(format!(
                        "expiry for unknown quotation {}",
                        e.quotation_id
                    ))
                })?;
                view.status = QuotationStatus::Expired;
                self.store.upsert(view);
            }
        }

        self.update_cursor(key, seq);
        Ok(())
    }

    /// Rebuild the view store from a full set of envelopes.
    ///
    /// Clears current views and cursors, then replays in deterministic
    /// (buyer, aggregate, sequence) order.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), QuotationProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        self.store.clear();
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }

        envs.sort_by_key(|e| {
            (
                *e.buyer_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
