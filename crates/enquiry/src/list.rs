use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quotelink_catalog::ProductId;
use quotelink_core::{Aggregate, AggregateId, AggregateRoot, BuyerId, DomainError, Entity};
use quotelink_events::Event;

/// Namespace for deriving the deterministic per-buyer enquiry stream id.
const ENQUIRY_LIST_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0xa7, 0xb8, 0x14, 0x9d, 0xad, 0x11, 0xd1, 0x80, 0xb4, 0x00, 0xc0, 0x4f, 0xd4, 0x30,
    0xc8,
]);

/// Enquiry list identifier. Exactly one list exists per buyer, so the id is
/// derived deterministically from the buyer id (UUIDv5).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnquiryListId(pub AggregateId);

impl EnquiryListId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn for_buyer(buyer_id: BuyerId) -> Self {
        let uuid = Uuid::new_v5(&ENQUIRY_LIST_NAMESPACE, buyer_id.as_uuid().as_bytes());
        Self(AggregateId::from_uuid(uuid))
    }
}

impl core::fmt::Display for EnquiryListId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// One product of interest: product reference + desired quantity (>= 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquiryEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl Entity for EnquiryEntry {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product_id
    }
}

/// Aggregate root: a buyer's enquiry list.
///
/// The list is created implicitly by the first `AddItem`. Uniqueness
/// invariant: at most one entry per product. Entry order is insertion order
/// and survives quantity updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnquiryList {
    id: EnquiryListId,
    buyer_id: Option<BuyerId>,
    entries: Vec<EnquiryEntry>,
    version: u64,
}

impl EnquiryList {
    /// Create an empty aggregate instance for rehydration.
    pub fn empty(id: EnquiryListId) -> Self {
        Self {
            id,
            buyer_id: None,
            entries: Vec::new(),
            version: 0,
        }
    }

    pub fn id_typed(&self) -> EnquiryListId {
        self.id
    }

    pub fn buyer_id(&self) -> Option<BuyerId> {
        self.buyer_id
    }

    pub fn entries(&self) -> &[EnquiryEntry] {
        &self.entries
    }

    pub fn entry(&self, product_id: ProductId) -> Option<&EnquiryEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.entry(product_id).is_some()
    }
}

impl AggregateRoot for EnquiryList {
    type Id = EnquiryListId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddItem {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetQuantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetQuantity {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnquiryListCommand {
    AddItem(AddItem),
    SetQuantity(SetQuantity),
    RemoveItem(RemoveItem),
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityChanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantityChanged {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub buyer_id: BuyerId,
    pub list_id: EnquiryListId,
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnquiryListEvent {
    ItemAdded(ItemAdded),
    QuantityChanged(QuantityChanged),
    ItemRemoved(ItemRemoved),
}

impl Event for EnquiryListEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EnquiryListEvent::ItemAdded(_) => "enquiry.list.item_added",
            EnquiryListEvent::QuantityChanged(_) => "enquiry.list.quantity_changed",
            EnquiryListEvent::ItemRemoved(_) => "enquiry.list.item_removed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EnquiryListEvent::ItemAdded(e) => e.occurred_at,
            EnquiryListEvent::QuantityChanged(e) => e.occurred_at,
            EnquiryListEvent::ItemRemoved(e) => e.occurred_at,
        }
    }
}

impl Aggregate for EnquiryList {
    type Command = EnquiryListCommand;
    type Event = EnquiryListEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EnquiryListEvent::ItemAdded(e) => {
                self.buyer_id = Some(e.buyer_id);
                self.entries.push(EnquiryEntry {
                    product_id: e.product_id,
                    quantity: e.quantity,
                });
            }
            EnquiryListEvent::QuantityChanged(e) => {
                if let Some(entry) = self
                    .entries
                    .iter_mut()
                    .find(|entry| entry.product_id == e.product_id)
                {
                    entry.quantity = e.quantity;
                }
            }
            EnquiryListEvent::ItemRemoved(e) => {
                self.entries.retain(|entry| entry.product_id != e.product_id);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EnquiryListCommand::AddItem(cmd) => self.handle_add(cmd),
            EnquiryListCommand::SetQuantity(cmd) => self.handle_set_quantity(cmd),
            EnquiryListCommand::RemoveItem(cmd) => self.handle_remove(cmd),
        }
    }
}

impl EnquiryList {
    fn ensure_owner(&self, buyer_id: BuyerId) -> Result<(), DomainError> {
        match self.buyer_id {
            None => Ok(()),
            Some(owner) if owner == buyer_id => Ok(()),
            Some(_) => Err(DomainError::invariant("buyer mismatch")),
        }
    }

    fn ensure_list_id(&self, list_id: EnquiryListId) -> Result<(), DomainError> {
        if self.id != list_id {
            return Err(DomainError::invariant("list_id mismatch"));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddItem) -> Result<Vec<EnquiryListEvent>, DomainError> {
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_list_id(cmd.list_id)?;

        if cmd.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        // Add-when-present is an explicit conflict, never a silent merge.
        if self.contains(cmd.product_id) {
            return Err(DomainError::conflict(
                "product already in enquiry list; update the quantity instead",
            ));
        }

        Ok(vec![EnquiryListEvent::ItemAdded(ItemAdded {
            buyer_id: cmd.buyer_id,
            list_id: cmd.list_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_quantity(&self, cmd: &SetQuantity) -> Result<Vec<EnquiryListEvent>, DomainError> {
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_list_id(cmd.list_id)?;

        if cmd.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        if !self.contains(cmd.product_id) {
            return Err(DomainError::not_found());
        }

        Ok(vec![EnquiryListEvent::QuantityChanged(QuantityChanged {
            buyer_id: cmd.buyer_id,
            list_id: cmd.list_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove(&self, cmd: &RemoveItem) -> Result<Vec<EnquiryListEvent>, DomainError> {
        self.ensure_owner(cmd.buyer_id)?;
        self.ensure_list_id(cmd.list_id)?;

        // Removal is idempotent: removing an absent entry is not an error.
        if !self.contains(cmd.product_id) {
            return Ok(vec![]);
        }

        Ok(vec![EnquiryListEvent::ItemRemoved(ItemRemoved {
            buyer_id: cmd.buyer_id,
            list_id: cmd.list_id,
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_buyer_id() -> BuyerId {
        BuyerId::new()
    }

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn list_for(buyer_id: BuyerId) -> EnquiryList {
        EnquiryList::empty(EnquiryListId::for_buyer(buyer_id))
    }

    fn add_cmd(buyer_id: BuyerId, product_id: ProductId, quantity: u32) -> EnquiryListCommand {
        EnquiryListCommand::AddItem(AddItem {
            buyer_id,
            list_id: EnquiryListId::for_buyer(buyer_id),
            product_id,
            quantity,
            occurred_at: test_time(),
        })
    }

    #[test]
    fn list_id_is_deterministic_per_buyer() {
        let buyer_id = test_buyer_id();
        assert_eq!(
            EnquiryListId::for_buyer(buyer_id),
            EnquiryListId::for_buyer(buyer_id)
        );
        assert_ne!(
            EnquiryListId::for_buyer(buyer_id),
            EnquiryListId::for_buyer(test_buyer_id())
        );
    }

    #[test]
    fn add_item_emits_item_added_event() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            EnquiryListEvent::ItemAdded(e) => {
                assert_eq!(e.buyer_id, buyer_id);
                assert_eq!(e.product_id, product_id);
                assert_eq!(e.quantity, 2);
            }
            _ => panic!("Expected ItemAdded event"),
        }
    }

    #[test]
    fn add_item_rejects_zero_quantity() {
        let buyer_id = test_buyer_id();
        let list = list_for(buyer_id);

        let err = list
            .handle(&add_cmd(buyer_id, test_product_id(), 0))
            .unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn adding_same_product_twice_is_a_conflict_not_a_merge() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let mut list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        list.apply(&events[0]);

        let err = list.handle(&add_cmd(buyer_id, product_id, 3)).unwrap_err();
        match err {
            DomainError::Conflict(_) => {}
            _ => panic!("Expected Conflict error for duplicate add"),
        }

        // The single existing entry is untouched.
        assert_eq!(list.entries().len(), 1);
        assert_eq!(list.entries()[0].quantity, 2);
    }

    #[test]
    fn set_quantity_replaces_in_place_and_preserves_order() {
        let buyer_id = test_buyer_id();
        let first = test_product_id();
        let second = test_product_id();
        let mut list = list_for(buyer_id);

        for (product_id, quantity) in [(first, 1), (second, 5)] {
            let events = list.handle(&add_cmd(buyer_id, product_id, quantity)).unwrap();
            list.apply(&events[0]);
        }

        let cmd = EnquiryListCommand::SetQuantity(SetQuantity {
            buyer_id,
            list_id: EnquiryListId::for_buyer(buyer_id),
            product_id: first,
            quantity: 7,
            occurred_at: test_time(),
        });
        let events = list.handle(&cmd).unwrap();
        list.apply(&events[0]);

        assert_eq!(list.entries()[0].product_id, first);
        assert_eq!(list.entries()[0].quantity, 7);
        assert_eq!(list.entries()[1].product_id, second);
    }

    #[test]
    fn set_quantity_rejects_missing_entry() {
        let buyer_id = test_buyer_id();
        let list = list_for(buyer_id);

        let cmd = EnquiryListCommand::SetQuantity(SetQuantity {
            buyer_id,
            list_id: EnquiryListId::for_buyer(buyer_id),
            product_id: test_product_id(),
            quantity: 3,
            occurred_at: test_time(),
        });
        let err = list.handle(&cmd).unwrap_err();
        match err {
            DomainError::NotFound => {}
            _ => panic!("Expected NotFound for missing entry"),
        }
    }

    #[test]
    fn set_quantity_rejects_zero() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let mut list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        list.apply(&events[0]);

        let cmd = EnquiryListCommand::SetQuantity(SetQuantity {
            buyer_id,
            list_id: EnquiryListId::for_buyer(buyer_id),
            product_id,
            quantity: 0,
            occurred_at: test_time(),
        });
        let err = list.handle(&cmd).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn remove_is_idempotent() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let mut list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        list.apply(&events[0]);

        let remove = EnquiryListCommand::RemoveItem(RemoveItem {
            buyer_id,
            list_id: EnquiryListId::for_buyer(buyer_id),
            product_id,
            occurred_at: test_time(),
        });

        let events = list.handle(&remove).unwrap();
        assert_eq!(events.len(), 1);
        list.apply(&events[0]);
        assert!(list.entries().is_empty());

        // Second removal emits nothing and succeeds.
        let events = list.handle(&remove).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn commands_from_another_buyer_are_rejected() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let mut list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        list.apply(&events[0]);

        let intruder = test_buyer_id();
        let cmd = EnquiryListCommand::RemoveItem(RemoveItem {
            buyer_id: intruder,
            list_id: list.id_typed(),
            product_id,
            occurred_at: test_time(),
        });
        let err = list.handle(&cmd).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("buyer mismatch") => {}
            _ => panic!("Expected InvariantViolation for buyer mismatch"),
        }
    }

    #[test]
    fn version_increments_on_apply() {
        let buyer_id = test_buyer_id();
        let mut list = list_for(buyer_id);
        assert_eq!(list.version(), 0);

        let events = list
            .handle(&add_cmd(buyer_id, test_product_id(), 1))
            .unwrap();
        list.apply(&events[0]);
        assert_eq!(list.version(), 1);
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let buyer_id = test_buyer_id();
        let product_id = test_product_id();
        let mut list = list_for(buyer_id);

        let events = list.handle(&add_cmd(buyer_id, product_id, 2)).unwrap();
        list.apply(&events[0]);
        let snapshot = list.clone();

        let cmd = add_cmd(buyer_id, test_product_id(), 1);
        let events1 = list.handle(&cmd).unwrap();
        let events2 = list.handle(&cmd).unwrap();

        assert_eq!(list, snapshot);
        assert_eq!(events1, events2);
    }
}
