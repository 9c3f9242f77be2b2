//! Explicit item selection for quotation requests.
//!
//! Selection state belongs to the caller: the core never reconstructs it
//! from the underlying list. `All` is a first-load convenience; once the
//! buyer has deselected anything the caller passes `Only(..)` and deselected
//! items stay deselected.

use serde::{Deserialize, Serialize};

use crate::list::EnquiryEntry;
use quotelink_catalog::ProductId;
use quotelink_core::ValueObject;

/// Which enquiry entries the buyer wants quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    /// Every currently valid entry (no explicit choice made yet).
    All,
    /// Exactly the named products, and nothing else.
    Only(Vec<ProductId>),
}

impl ValueObject for Selection {}

impl Selection {
    pub fn only(product_ids: impl Into<Vec<ProductId>>) -> Self {
        Self::Only(product_ids.into())
    }

    /// Intersect the given entries with this selection, preserving entry
    /// order. Selected ids that are not present in `entries` are ignored.
    pub fn apply(&self, entries: &[EnquiryEntry]) -> Vec<EnquiryEntry> {
        match self {
            Selection::All => entries.to_vec(),
            Selection::Only(ids) => entries
                .iter()
                .filter(|entry| ids.contains(&entry.product_id))
                .copied()
                .collect(),
        }
    }
}
