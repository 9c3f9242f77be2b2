//! Read model storage abstractions.

pub mod quotation_store;

pub use quotation_store::{InMemoryQuotationViewStore, QuotationView, QuotationViewStore};
