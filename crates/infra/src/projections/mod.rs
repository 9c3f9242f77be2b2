//! Projection implementations (read model builders).
//!
//! Projections consume domain events and build query-optimized read models.
//! All projections are:
//! - **Rebuildable**: can be reconstructed from the event stream
//! - **Owner-isolated**: every stream belongs to exactly one buyer
//! - **Idempotent**: safe for at-least-once delivery

pub mod quotations;

pub use quotations::{QUOTATION_AGGREGATE_TYPE, QuotationProjectionError, QuotationsProjection};
