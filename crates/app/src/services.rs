//! In-memory infra wiring: store + bus + projection + catalog.

use std::sync::Arc;

use quotelink_events::{EventBus, EventEnvelope, InMemoryEventBus};
use quotelink_infra::catalog::InMemoryCatalog;
use quotelink_infra::command_dispatcher::CommandDispatcher;
use quotelink_infra::event_store::InMemoryEventStore;
use quotelink_infra::projections::QuotationsProjection;
use quotelink_infra::read_model::InMemoryQuotationViewStore;
use quotelink_quotation::ExpiryPolicy;

use crate::enquiry::EnquiryService;
use crate::queries::QuotationQueries;
use crate::quotation::QuotationService;

pub type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;
pub type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Bus>;
pub type Projection = QuotationsProjection<Arc<InMemoryQuotationViewStore>>;

/// Fully wired application services.
///
/// Commands flow through the dispatcher into the event store and out onto
/// the bus; a background subscriber keeps the quotation views current.
pub struct AppServices {
    dispatcher: Arc<Dispatcher>,
    catalog: Arc<InMemoryCatalog>,
    views: Arc<InMemoryQuotationViewStore>,
    expiry_policy: ExpiryPolicy,
}

impl AppServices {
    pub fn build() -> Self {
        Self::build_with_policy(ExpiryPolicy::from_env())
    }

    pub fn build_with_policy(expiry_policy: ExpiryPolicy) -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let dispatcher = Arc::new(CommandDispatcher::new(store, bus.clone()));
        let catalog = Arc::new(InMemoryCatalog::new());
        let views = Arc::new(InMemoryQuotationViewStore::new());
        let projection = Arc::new(QuotationsProjection::new(views.clone()));

        // Background subscriber: bus -> quotation views. Subscribed before
        // any command is dispatched so no envelope is missed.
        let bus_clone = bus.clone();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
        std::thread::spawn(move || {
            let sub = bus_clone.subscribe();
            let _ = ready_tx.send(());
            loop {
                match sub.recv() {
                    Ok(env) => {
                        if let Err(e) = projection.apply_envelope(&env) {
                            tracing::warn!("projection apply failed: {e}");
                        }
                    }
                    Err(_) => break,
                }
            }
        });
        let _ = ready_rx.recv_timeout(std::time::Duration::from_secs(1));

        Self {
            dispatcher,
            catalog,
            views,
            expiry_policy,
        }
    }

    /// The catalog adapter. Mutable access (upsert/remove) simulates the
    /// external catalog service drifting out from under enquiry entries.
    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        &self.catalog
    }

    pub fn expiry_policy(&self) -> ExpiryPolicy {
        self.expiry_policy
    }

    pub fn enquiries(&self) -> EnquiryService {
        EnquiryService::new(self.dispatcher.clone(), self.catalog.clone())
    }

    pub fn quotations(&self) -> QuotationService {
        QuotationService::new(self.enquiries(), self.dispatcher.clone(), self.expiry_policy)
    }

    pub fn queries(&self) -> QuotationQueries {
        QuotationQueries::new(self.views.clone(), self.expiry_policy)
    }
}
