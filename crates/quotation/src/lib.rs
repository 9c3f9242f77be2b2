//! Quotation domain module (event-sourced).
//!
//! A quotation is a buyer-initiated, non-binding request for seller pricing
//! on a snapshot of enquiry items. The indicative prices and the estimated
//! total are fixed at submission and never recomputed; the seller's quoted
//! total is an independent figure, never derived from the estimate.

pub mod expiry;
pub mod quotation;

pub use expiry::ExpiryPolicy;
pub use quotation::{
    CancelQuotation, ContactSnapshot, ExpireQuotation, Quotation, QuotationCancelled,
    QuotationCommand, QuotationEvent, QuotationExpired, QuotationId, QuotationItem,
    QuotationStatus, QuotationSubmitted, RespondToQuotation, SellerResponded, SellerResponse,
    SubmitQuotation,
};
