//! Arena of resting order slots with stable integer keys.
//!
//! Every resting order lives in exactly one slot, addressed by the key
//! `slab` handed back on insertion. A [`super::level::PriceLevel`] never
//! owns `Order` values directly; it only stores head/tail keys and each
//! slot stores its own intrusive `prev`/`next` links, so splicing a slot
//! out of a level's FIFO is O(1) and never relocates a resting order in
//! memory.

use crate::order::Order;
use slab::Slab;

pub(crate) struct OrderSlot {
    pub(crate) order: Order,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

/// Arena key for a resting order. Opaque outside this module and
/// [`super::level`]; the book's `id_index` stores these to make
/// `cancel`/`modify` O(1) once the key is known.
pub type ArenaKey = usize;

#[derive(Default)]
pub struct OrderArena {
    slab: Slab<OrderSlot>,
}

impl OrderArena {
    pub fn new() -> Self {
        Self { slab: Slab::new() }
    }

    pub(crate) fn insert(&mut self, order: Order) -> ArenaKey {
        self.slab.insert(OrderSlot { order, prev: None, next: None })
    }

    pub(crate) fn remove(&mut self, key: ArenaKey) -> Order {
        self.slab.remove(key).order
    }

    pub fn get(&self, key: ArenaKey) -> Option<&Order> {
        self.slab.get(key).map(|slot| &slot.order)
    }

    pub fn get_mut(&mut self, key: ArenaKey) -> Option<&mut Order> {
        self.slab.get_mut(key).map(|slot| &mut slot.order)
    }

    pub(crate) fn prev(&self, key: ArenaKey) -> Option<ArenaKey> {
        self.slab[key].prev
    }

    pub(crate) fn next(&self, key: ArenaKey) -> Option<ArenaKey> {
        self.slab[key].next
    }

    pub(crate) fn set_prev(&mut self, key: ArenaKey, prev: Option<ArenaKey>) {
        self.slab[key].prev = prev;
    }

    pub(crate) fn set_next(&mut self, key: ArenaKey, next: Option<ArenaKey>) {
        self.slab[key].next = next;
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}
