//! Enquiry list service: aggregation of products of interest per buyer.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use quotelink_catalog::{CatalogItem, CatalogReader, ProductId};
use quotelink_core::BuyerId;
use quotelink_enquiry::{
    AddItem, EnquiryEntry, EnquiryList, EnquiryListCommand, EnquiryListId, RemoveItem, Selection,
    SetQuantity,
};
use quotelink_infra::command_dispatcher::DispatchError;

use crate::services::Dispatcher;

pub const ENQUIRY_LIST_AGGREGATE_TYPE: &str = "enquiry.list";

/// One enquiry entry resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct EnquiryLine {
    pub entry: EnquiryEntry,
    pub item: CatalogItem,
}

/// The read side of a buyer's enquiry list.
///
/// Entries whose product no longer resolves in the catalog are filtered out,
/// not surfaced as errors; `filtered_count` reports how many were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct EnquiryListing {
    pub lines: Vec<EnquiryLine>,
    pub filtered_count: u32,
}

/// Buyer-facing enquiry list operations.
///
/// Writes go through the command pipeline; reads rehydrate the buyer's own
/// stream directly (read-your-writes, no projection lag).
pub struct EnquiryService {
    dispatcher: Arc<Dispatcher>,
    catalog: Arc<dyn CatalogReader>,
}

impl EnquiryService {
    pub fn new(dispatcher: Arc<Dispatcher>, catalog: Arc<dyn CatalogReader>) -> Self {
        Self {
            dispatcher,
            catalog,
        }
    }

    pub fn add_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let list_id = EnquiryListId::for_buyer(buyer_id);
        let cmd = EnquiryListCommand::AddItem(AddItem {
            buyer_id,
            list_id,
            product_id,
            quantity,
            occurred_at: now,
        });
        self.dispatch(buyer_id, list_id, cmd)
    }

    pub fn set_quantity(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let list_id = EnquiryListId::for_buyer(buyer_id);
        let cmd = EnquiryListCommand::SetQuantity(SetQuantity {
            buyer_id,
            list_id,
            product_id,
            quantity,
            occurred_at: now,
        });
        self.dispatch(buyer_id, list_id, cmd)
    }

    pub fn remove_item(
        &self,
        buyer_id: BuyerId,
        product_id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let list_id = EnquiryListId::for_buyer(buyer_id);
        let cmd = EnquiryListCommand::RemoveItem(RemoveItem {
            buyer_id,
            list_id,
            product_id,
            occurred_at: now,
        });
        self.dispatch(buyer_id, list_id, cmd)
    }

    /// List the buyer's enquiry entries resolved against the catalog.
    ///
    /// Dangling product references (catalog item removed after the entry was
    /// added) are silently filtered; the count is returned and logged.
    pub fn list(&self, buyer_id: BuyerId) -> Result<EnquiryListing, DispatchError> {
        let list = self.rehydrate(buyer_id)?;

        let mut lines = Vec::with_capacity(list.entries().len());
        let mut filtered_count = 0u32;
        for entry in list.entries() {
            match self.catalog.get_item(entry.product_id) {
                Some(item) => lines.push(EnquiryLine {
                    entry: *entry,
                    item,
                }),
                None => filtered_count += 1,
            }
        }

        if filtered_count > 0 {
            tracing::warn!(
                %buyer_id,
                filtered_count,
                "dropped enquiry entries with dangling product references"
            );
        }

        Ok(EnquiryListing {
            lines,
            filtered_count,
        })
    }

    /// Intersect the buyer's valid entries with an explicit selection,
    /// preserving list order. Selected ids no longer in the list are ignored.
    pub fn select_subset(
        &self,
        buyer_id: BuyerId,
        selection: &Selection,
    ) -> Result<Vec<EnquiryLine>, DispatchError> {
        let listing = self.list(buyer_id)?;

        let entries: Vec<EnquiryEntry> = listing.lines.iter().map(|l| l.entry).collect();
        let selected = selection.apply(&entries);

        Ok(listing
            .lines
            .into_iter()
            .filter(|line| selected.contains(&line.entry))
            .collect())
    }

    fn dispatch(
        &self,
        buyer_id: BuyerId,
        list_id: EnquiryListId,
        cmd: EnquiryListCommand,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(
                buyer_id,
                list_id.0,
                ENQUIRY_LIST_AGGREGATE_TYPE,
                cmd,
                |_, id| EnquiryList::empty(EnquiryListId::new(id)),
            )
            .map(|_| ())
    }

    fn rehydrate(&self, buyer_id: BuyerId) -> Result<EnquiryList, DispatchError> {
        let list_id = EnquiryListId::for_buyer(buyer_id);
        self.dispatcher.rehydrate(buyer_id, list_id.0, |_, id| {
            EnquiryList::empty(EnquiryListId::new(id))
        })
    }
}
