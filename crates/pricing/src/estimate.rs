use serde::{Deserialize, Serialize};

use quotelink_catalog::CatalogItem;

/// Flat tax applied to every indicative subtotal. A domain constant, not
/// configurable per item or category.
pub const TAX_RATE: f64 = 0.18;

/// One priced line: unit prices plus a quantity.
///
/// Prices are optional because catalog records can be incomplete; a missing
/// unit price contributes zero to the subtotal and is counted in
/// [`Estimate::missing_prices`] instead of failing the computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLine {
    pub unit_price: Option<f64>,
    pub list_price: Option<f64>,
    pub quantity: u32,
}

impl PriceLine {
    pub fn from_item(item: &CatalogItem, quantity: u32) -> Self {
        Self {
            unit_price: item.unit_price,
            list_price: item.list_price,
            quantity,
        }
    }
}

/// Result of an indicative pricing computation.
///
/// Stored values keep full floating precision; rounding happens only at
/// presentation via [`display_amount`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub savings: f64,
    /// Number of lines whose unit price was missing and treated as zero.
    /// Callers must surface this (warning-level log) rather than hide it: a
    /// silently-zeroed price is a correctness hazard.
    pub missing_prices: u32,
}

impl Estimate {
    pub fn zero() -> Self {
        Self {
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            savings: 0.0,
            missing_prices: 0,
        }
    }
}

/// Compute an indicative estimate for a list of priced lines.
///
/// - `subtotal` sums `effective_unit_price * quantity` where a missing unit
///   price counts as zero.
/// - `tax` is a flat 18% of the subtotal.
/// - `savings` sums only positive `(list_price - unit_price) * quantity`
///   differences; an item priced above its own list price contributes zero,
///   never a negative adjustment.
///
/// Empty input returns the zero estimate; this function never fails.
pub fn estimate(lines: &[PriceLine]) -> Estimate {
    let mut subtotal = 0.0;
    let mut savings = 0.0;
    let mut missing_prices = 0u32;

    for line in lines {
        let quantity = f64::from(line.quantity);

        let unit = match line.unit_price {
            Some(price) => price,
            None => {
                missing_prices += 1;
                0.0
            }
        };
        subtotal += unit * quantity;

        if let Some(list) = line.list_price {
            let per_unit = list - unit;
            if per_unit > 0.0 {
                savings += per_unit * quantity;
            }
        }
    }

    let tax = subtotal * TAX_RATE;

    Estimate {
        subtotal,
        tax,
        total: subtotal + tax,
        savings,
        missing_prices,
    }
}

/// Display-rounding policy for indicative amounts.
///
/// - amounts >= 1000 render as the nearest integer
/// - amounts with a zero fractional part render as an integer
/// - everything else renders with one decimal place
///
/// Applies only at presentation; stored values are never rounded.
pub fn display_amount(amount: f64) -> String {
    if amount >= 1000.0 {
        format!("{}", amount.round() as i64)
    } else if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{amount:.1}")
    }
}
