//! Application services: the outward surface consumed by a UI/API layer.
//!
//! Three services over the event-sourced core:
//! - [`EnquiryService`]: a buyer's enquiry list (add, set quantity, remove,
//!   list against the catalog, subset selection)
//! - [`QuotationService`]: quotation lifecycle (create, respond, cancel,
//!   expire, preview estimate)
//! - [`QuotationQueries`]: read-side access to projection-maintained views

pub mod enquiry;
pub mod queries;
pub mod quotation;
pub mod services;

pub use enquiry::{EnquiryLine, EnquiryListing, EnquiryService};
pub use queries::QuotationQueries;
pub use quotation::QuotationService;
pub use services::AppServices;
