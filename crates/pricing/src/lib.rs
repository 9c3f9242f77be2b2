//! Indicative pricing engine.
//!
//! Pure functions only: no IO, no clock, no storage. Given `(item, quantity)`
//! pairs the engine computes subtotal, tax, total and savings. All amounts are
//! non-binding display figures.

pub mod estimate;

pub use estimate::{Estimate, PriceLine, TAX_RATE, display_amount, estimate};
