//! Enquiry list domain module (event-sourced).
//!
//! A buyer's working set of products of interest, pre-quotation. Business
//! rules only: no IO, no HTTP, no storage. Dangling-reference filtering
//! against the catalog happens in the application layer, which owns the
//! catalog collaborator.

pub mod list;
pub mod selection;

pub use list::{
    AddItem, EnquiryEntry, EnquiryList, EnquiryListCommand, EnquiryListEvent, EnquiryListId,
    ItemAdded, ItemRemoved, QuantityChanged, RemoveItem, SetQuantity,
};
pub use selection::Selection;
