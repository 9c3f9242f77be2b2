//! Quotation lifecycle service.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use quotelink_core::{AggregateId, BuyerId, SellerId};
use quotelink_enquiry::Selection;
use quotelink_infra::command_dispatcher::DispatchError;
use quotelink_infra::projections::QUOTATION_AGGREGATE_TYPE;
use quotelink_pricing::{Estimate, PriceLine, estimate};
use quotelink_quotation::{
    CancelQuotation, ContactSnapshot, ExpireQuotation, ExpiryPolicy, Quotation, QuotationCommand,
    QuotationId, QuotationItem, RespondToQuotation, SubmitQuotation,
};

use crate::enquiry::{EnquiryLine, EnquiryService};
use crate::services::Dispatcher;

/// Quotation lifecycle operations.
///
/// Creation snapshots the catalog's current indicative prices into the
/// quotation; later catalog edits never change what the buyer was shown.
pub struct QuotationService {
    enquiries: EnquiryService,
    dispatcher: Arc<Dispatcher>,
    expiry_policy: ExpiryPolicy,
}

impl QuotationService {
    pub fn new(
        enquiries: EnquiryService,
        dispatcher: Arc<Dispatcher>,
        expiry_policy: ExpiryPolicy,
    ) -> Self {
        Self {
            enquiries,
            dispatcher,
            expiry_policy,
        }
    }

    /// Turn the selected subset of the buyer's enquiry list into a pending
    /// quotation. Returns the new quotation id.
    ///
    /// An item whose catalog price is missing is quoted at zero; the zeroed
    /// count is logged, never silently swallowed.
    pub fn create_quotation(
        &self,
        buyer_id: BuyerId,
        selection: &Selection,
        contact: ContactSnapshot,
        customer_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<QuotationId, DispatchError> {
        let lines = self.enquiries.select_subset(buyer_id, selection)?;

        let mut missing_prices = 0u32;
        let items: Vec<QuotationItem> = lines
            .iter()
            .map(|line| QuotationItem {
                product_id: line.entry.product_id,
                quantity: line.entry.quantity,
                indicative_price: line.item.unit_price.unwrap_or_else(|| {
                    missing_prices += 1;
                    0.0
                }),
            })
            .collect();

        if missing_prices > 0 {
            tracing::warn!(
                %buyer_id,
                missing_prices,
                "quoting items without a catalog price at zero"
            );
        }

        let quotation_id = QuotationId::new(AggregateId::new());
        let cmd = QuotationCommand::SubmitQuotation(SubmitQuotation {
            buyer_id,
            quotation_id,
            items,
            contact,
            customer_notes,
            occurred_at: now,
        });
        self.dispatch(buyer_id, quotation_id, cmd)?;

        tracing::info!(%buyer_id, %quotation_id, "quotation submitted");
        Ok(quotation_id)
    }

    /// Record a seller's answer to a pending quotation.
    #[allow(clippy::too_many_arguments)]
    pub fn respond(
        &self,
        buyer_id: BuyerId,
        quotation_id: QuotationId,
        seller_id: SellerId,
        quoted_total: f64,
        notes: Option<String>,
        valid_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let cmd = QuotationCommand::RespondToQuotation(RespondToQuotation {
            buyer_id,
            quotation_id,
            seller_id,
            quoted_total,
            notes,
            valid_until,
            occurred_at: now,
        });
        self.dispatch(buyer_id, quotation_id, cmd)
    }

    /// Cancel a pending quotation.
    pub fn cancel(
        &self,
        buyer_id: BuyerId,
        quotation_id: QuotationId,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let cmd = QuotationCommand::CancelQuotation(CancelQuotation {
            buyer_id,
            quotation_id,
            occurred_at: now,
        });
        self.dispatch(buyer_id, quotation_id, cmd)
    }

    /// Expire a pending quotation that has outlived the configured age.
    ///
    /// Intended for an external scheduler sweep. The policy predicate is
    /// checked against current state first; the aggregate then enforces the
    /// `Pending`-only transition atomically with the write, so a sweep racing
    /// a seller response cannot both commit.
    pub fn expire(
        &self,
        buyer_id: BuyerId,
        quotation_id: QuotationId,
        now: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let quotation = self.dispatcher.rehydrate(buyer_id, quotation_id.0, |_, id| {
            Quotation::empty(QuotationId::new(id))
        })?;
        if quotation.created_at().is_none() {
            return Err(DispatchError::NotFound);
        }
        if !quotation.is_expired(&self.expiry_policy, now) {
            return Err(DispatchError::Validation(
                "quotation is not past the expiry threshold".to_string(),
            ));
        }

        let cmd = QuotationCommand::ExpireQuotation(ExpireQuotation {
            buyer_id,
            quotation_id,
            occurred_at: now,
        });
        self.dispatch(buyer_id, quotation_id, cmd)
    }

    /// Compute the indicative estimate for a selection without persisting
    /// anything. Uses live catalog prices, including list prices for the
    /// savings figure.
    pub fn preview_estimate(
        &self,
        buyer_id: BuyerId,
        selection: &Selection,
    ) -> Result<Estimate, DispatchError> {
        let lines = self.enquiries.select_subset(buyer_id, selection)?;
        let price_lines: Vec<PriceLine> = lines.iter().map(price_line).collect();
        let result = estimate(&price_lines);

        if result.missing_prices > 0 {
            tracing::warn!(
                %buyer_id,
                missing_prices = result.missing_prices,
                "estimate includes items without a catalog price"
            );
        }

        Ok(result)
    }

    fn dispatch(
        &self,
        buyer_id: BuyerId,
        quotation_id: QuotationId,
        cmd: QuotationCommand,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(
                buyer_id,
                quotation_id.0,
                QUOTATION_AGGREGATE_TYPE,
                cmd,
                |_, id| Quotation::empty(QuotationId::new(id)),
            )
            .map(|_| ())
    }
}

fn price_line(line: &EnquiryLine) -> PriceLine {
    PriceLine::from_item(&line.item, line.entry.quantity)
}
