use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quotelink_catalog::ProductId;
use quotelink_core::{Aggregate, AggregateId, AggregateRoot, BuyerId, DomainError, SellerId};
use quotelink_events::Event;
use quotelink_pricing::{PriceLine, estimate};

use crate::expiry::ExpiryPolicy;

/// Quotation identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotationId(pub AggregateId);

impl QuotationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for QuotationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Quotation status lifecycle.
///
/// `Pending` is the only state with outgoing transitions; `Responded`,
/// `Cancelled` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    Pending,
    Responded,
    Cancelled,
    Expired,
}

/// One quoted line: product, quantity and the unit price shown to the buyer
/// at submission time. The price is a snapshot, not a live reference — it is
/// never recomputed from the catalog, even for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotationItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub indicative_price: f64,
}

/// Buyer contact and delivery details, captured by value at submission so
/// later profile edits never retroactively alter history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSnapshot {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ContactSnapshot {
    fn validate(&self) -> Result<(), DomainError> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "contact {field} cannot be empty"
                )));
            }
        }
        Ok(())
    }
}

/// The seller's answer: an independently supplied total, optional notes and
/// an optional validity window. Never auto-derived from the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerResponse {
    pub quoted_total: f64,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

/// Aggregate root: Quotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Quotation {
    id: QuotationId,
    buyer_id: Option<BuyerId>,
    seller_id: Option<SellerId>,
    items: Vec<QuotationItem>,
    contact: Option<ContactSnapshot>,
    customer_notes: Option<String>,
    estimated_total: f64,
    status: QuotationStatus,
    seller_response: Option<SellerResponse>,
    created_at: Option<DateTime<Utc>>,
    responded_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Quotation {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: QuotationId) -> Self {
        Self {
            id,
            buyer_id: None,
            seller_id: None,
            items: Vec::new(),
            contact: None,
            customer_notes: None,
            estimated_total: 0.0,
            status: QuotationStatus::Pending,
            seller_response: None,
            created_at: None,
            responded_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> QuotationId {
        self.id
    }

    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    pub fn seller_id(&self) -> Option<SellerId> {
        self.seller_id
    }

    pub fn items(&self) -> &[QuotationItem] {
        &self.items
    }

    pub fn contact(&self) -> Option<&ContactSnapshot> {
        self.contact.as_ref()
    }

    pub fn customer_notes(&self) -> Option<&str> {
        self.customer_notes.as_deref()
    }

    /// The total shown to the buyer when they asked. Fixed at submission.
    pub fn estimated_total(&self) -> f64 {
        self.estimated_total
    }

    pub fn status(&self) -> QuotationStatus {
        self.status
    }

    pub fn seller_response(&self) -> Option<&SellerResponse> {
        self.seller_response.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.status, QuotationStatus::Pending)
    }

    /// Pure expiry predicate: pending and past the policy threshold.
    ///
    /// This never mutates anything; the transition itself is the `Expire`
    /// command, triggered by an external scheduler.
    pub fn is_expired(&self, policy: &ExpiryPolicy, now: DateTime<Utc>) -> bool {
        self.is_pending()
            && self
                .created_at
                .is_some_and(|created| policy.is_past_threshold(created, now))
    }
}

impl AggregateRoot for Quotation {
    type Id = QuotationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: SubmitQuotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitQuotation {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub items: Vec<QuotationItem>,
    pub contact: ContactSnapshot,
    pub customer_notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RespondToQuotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RespondToQuotation {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub seller_id: SellerId,
    pub quoted_total: f64,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelQuotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelQuotation {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ExpireQuotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpireQuotation {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuotationCommand {
    SubmitQuotation(SubmitQuotation),
    RespondToQuotation(RespondToQuotation),
    CancelQuotation(CancelQuotation),
    ExpireQuotation(ExpireQuotation),
}

/// Event: QuotationSubmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationSubmitted {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub items: Vec<QuotationItem>,
    pub contact: ContactSnapshot,
    pub customer_notes: Option<String>,
    /// Computed once from the item snapshots; never recomputed afterwards.
    pub estimated_total: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SellerResponded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellerResponded {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub seller_id: SellerId,
    pub quoted_total: f64,
    pub notes: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuotationCancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationCancelled {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuotationExpired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationExpired {
    pub buyer_id: BuyerId,
    pub quotation_id: QuotationId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuotationEvent {
    QuotationSubmitted(QuotationSubmitted),
    SellerResponded(SellerResponded),
    QuotationCancelled(QuotationCancelled),
    QuotationExpired(QuotationExpired),
}

impl Event for QuotationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            QuotationEvent::QuotationSubmitted(_) => "quotation.submitted",
            QuotationEvent::SellerResponded(_) => "quotation.seller_responded",
            QuotationEvent::QuotationCancelled(_) => "quotation.cancelled",
            QuotationEvent::QuotationExpired(_) => "quotation.expired",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            QuotationEvent::QuotationSubmitted(e) => e.occurred_at,
            QuotationEvent::SellerResponded(e) => e.occurred_at,
            QuotationEvent::QuotationCancelled(e) => e.occurred_at,
            QuotationEvent::QuotationExpired(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Quotation {
    type Command = QuotationCommand;
    type Event = QuotationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            QuotationEvent::QuotationSubmitted(e) => {
                self.id = e.quotation_id;
                self.buyer_id = Some(e.buyer_id);
                self.items = e.items.clone();
                self.contact = Some(e.contact.clone());
                self.customer_notes = e.customer_notes.clone();
                self.estimated_total = e.estimated_total;
                self.status = QuotationStatus::Pending;
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            QuotationEvent::SellerResponded(e) => {
                self.seller_id = Some(e.seller_id);
                self.seller_response = Some(SellerResponse {
                    quoted_total: e.quoted_total,
                    notes: e.notes.clone(),
                    valid_until: e.valid_until,
                });
                self.responded_at = Some(e.occurred_at);
                self.status = QuotationStatus::Responded;
            }
            QuotationEvent::QuotationCancelled(_) => {
                self.status = QuotationStatus::Cancelled;
            }
            QuotationEvent::QuotationExpired(_) => {
                self.status = QuotationStatus::Expired;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            QuotationCommand::SubmitQuotation(cmd) => self.handle_submit(cmd),
            QuotationCommand::RespondToQuotation(cmd) => self.handle_respond(cmd),
            QuotationCommand::CancelQuotation(cmd) => self.handle_cancel(cmd),
            QuotationCommand::ExpireQuotation(cmd) => self.handle_expire(cmd),
        }
    }
}

impl Quotation {
    fn ensure_owner(&self, buyer_id: BuyerId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.buyer_id != Some(buyer_id) {
            return Err(DomainError::invariant("buyer mismatch"));
        }
        Ok(())
    }

    fn ensure_quotation_id(&self, quotation_id: QuotationId) -> Result<(), DomainError> {
        if self.id != quotation_id {
            return Err(DomainError::invariant("quotation_id mismatch"));
        }
        Ok(())
    }

    fn handle_submit(&self, cmd: &SubmitQuotation) -> Result<Vec<QuotationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("quotation already exists"));
        }

        if cmd.items.is_empty() {
            return Err(DomainError::validation("empty selection"));
        }

        for item in &cmd.items {
            if item.quantity < 1 {
                return Err(DomainError::validation("quantity must be at least 1"));
            }
            if !item.indicative_price.is_finite() || item.indicative_price < 0.0 {
                return Err(DomainError::validation(
                    "indicative price must be a non-negative finite amount",
                ));
            }
        }

        cmd.contact.validate()?;

        // Snapshot pricing: the estimate is derived from the items' captured
        // indicative prices and is stored on the event, never recomputed.
        let lines: Vec<PriceLine> = cmd
            .items
            .iter()
            .map(|item| PriceLine {
                unit_price: Some(item.indicative_price),
                list_price: None,
                quantity: item.quantity,
            })
            .collect();
        let estimated_total = estimate(&lines).total;

        Ok(vec![QuotationEvent::QuotationSubmitted(QuotationSubmitted {
            buyer_id: cmd.buyer_id,
            quotation_id: cmd.quotation_id,
            items: cmd.items.clone(),
            contact: cmd.contact.clone(),
            customer_notes: cmd.customer_notes.clone(),
            estimated_total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_respond(&self, cmd: &RespondToQuotation) -> Result<Vec<QuotationEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_quotation_id(cmd.quotation_id)?;

        if self.status != QuotationStatus::Pending {
            return Err(DomainError::invalid_transition(
                "only pending quotations can be answered",
            ));
        }

        if !cmd.quoted_total.is_finite() || cmd.quoted_total <= 0.0 {
            return Err(DomainError::validation(
                "quoted total must be a positive finite amount",
            ));
        }

        Ok(vec![QuotationEvent::SellerResponded(SellerResponded {
            buyer_id: cmd.buyer_id,
            quotation_id: cmd.quotation_id,
            seller_id: cmd.seller_id,
            quoted_total: cmd.quoted_total,
            notes: cmd.notes.clone(),
            valid_until: cmd.valid_until,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelQuotation) -> Result<Vec<QuotationEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_quotation_id(cmd.quotation_id)?;

        if self.status != QuotationStatus::Pending {
            return Err(DomainError::invalid_transition(
                "only pending quotations can be cancelled",
            ));
        }

        Ok(vec![QuotationEvent::QuotationCancelled(QuotationCancelled {
            buyer_id: cmd.buyer_id,
            quotation_id: cmd.quotation_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_expire(&self, cmd: &ExpireQuotation) -> Result<Vec<QuotationEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_quotation_id(cmd.quotation_id)?;

        if self.status != QuotationStatus::Pending {
            return Err(DomainError::invalid_transition(
                "only pending quotations can expire",
            ));
        }

        Ok(vec![QuotationEvent::QuotationExpired(QuotationExpired {
            buyer_id: cmd.buyer_id,
            quotation_id: cmd.quotation_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
