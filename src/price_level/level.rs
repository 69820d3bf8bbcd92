//! FIFO queue of resting orders at a single price.

use crate::order::{Order, OrderId};
use crate::price_level::arena::{ArenaKey, OrderArena};
use crate::tick::Tick;
use tracing::trace;

/// An ordered sequence of resting orders at one price, ordered by
/// `submit_ts` then arrival sequence. Maintains a cached
/// `aggregate_quantity` equal to the sum of `remaining_quantity` of its
/// members; every operation restores `aggregate == Σ remaining` before
/// returning.
pub struct PriceLevel {
    price: Tick,
    head: Option<ArenaKey>,
    tail: Option<ArenaKey>,
    count: usize,
    aggregate: u64,
}

impl PriceLevel {
    pub fn new(price: Tick) -> Self {
        Self { price, head: None, tail: None, count: 0, aggregate: 0 }
    }

    pub fn price(&self) -> Tick {
        self.price
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn aggregate(&self) -> u64 {
        self.aggregate
    }

    /// Place at tail; update aggregate. Precondition: `order.price ==
    /// Some(self.price())` for non-market orders (enforced by callers).
    pub fn append(&mut self, arena: &mut OrderArena, order: Order) -> ArenaKey {
        debug_assert!(order.remaining_quantity > 0);
        self.aggregate += order.remaining_quantity;
        let key = arena.insert(order);
        arena.set_prev(key, self.tail);
        arena.set_next(key, None);
        match self.tail {
            Some(old_tail) => arena.set_next(old_tail, Some(key)),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.count += 1;
        trace!(price = self.price.value(), key, "appended order to level");
        key
    }

    /// Observe the head without removal.
    pub fn peek_front<'a>(&self, arena: &'a OrderArena) -> Option<&'a Order> {
        self.head.and_then(|key| arena.get(key))
    }

    pub fn front_key(&self) -> Option<ArenaKey> {
        self.head
    }

    /// Remove and return the head order, updating the aggregate.
    pub fn pop_front(&mut self, arena: &mut OrderArena) -> Option<Order> {
        let key = self.head?;
        Some(self.unlink(arena, key))
    }

    /// Excise an order by its arena key (obtained from the book's
    /// `id_index`). O(1) via the intrusive links.
    pub fn remove(&mut self, arena: &mut OrderArena, key: ArenaKey) -> Order {
        self.unlink(arena, key)
    }

    fn unlink(&mut self, arena: &mut OrderArena, key: ArenaKey) -> Order {
        let prev = arena.prev(key);
        let next = arena.next(key);
        match prev {
            Some(p) => arena.set_next(p, next),
            None => self.head = next,
        }
        match next {
            Some(n) => arena.set_prev(n, prev),
            None => self.tail = prev,
        }
        self.count -= 1;
        let order = arena.remove(key);
        self.aggregate -= order.remaining_quantity;
        trace!(price = self.price.value(), key, "removed order from level");
        order
    }

    /// Decrement a resting order's remaining and displayed quantity in
    /// place, keeping the aggregate consistent. Pops and returns the
    /// order once its *displayed* slice is exhausted — for a plain
    /// order this coincides with `remaining_quantity` reaching zero; for
    /// an iceberg it happens earlier, while `remaining_quantity` (the
    /// hidden reserve included) may still be positive, signalling the
    /// caller to schedule a refresh rather than treat the order as filled.
    pub fn fill(&mut self, arena: &mut OrderArena, key: ArenaKey, qty: u64) -> Option<Order> {
        let displayed_after = {
            let order = arena.get_mut(key).expect("fill against live key");
            debug_assert!(qty <= order.displayed_quantity);
            order.remaining_quantity -= qty;
            order.displayed_quantity -= qty;
            order.displayed_quantity
        };
        if displayed_after == 0 {
            // `unlink` subtracts the order's full (post-fill) remaining
            // quantity from the aggregate in one step, which correctly
            // accounts for both the traded `qty` and any hidden iceberg
            // reserve leaving the level together.
            Some(self.unlink(arena, key))
        } else {
            self.aggregate -= qty;
            None
        }
    }

    /// Adjust the cached aggregate directly, for callers that mutate a
    /// resting order's `remaining_quantity` through [`OrderArena::get_mut`]
    /// outside of [`Self::fill`] (e.g. a priority-preserving quantity-only
    /// modify).
    pub fn decrement_aggregate(&mut self, delta: u64) {
        self.aggregate -= delta;
    }

    /// Iterate resting order ids head-to-tail without mutating the level.
    pub fn order_ids<'a>(&'a self, arena: &'a OrderArena) -> impl Iterator<Item = OrderId> + 'a {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let key = cursor?;
            cursor = arena.next(key);
            arena.get(key).map(|o| o.id)
        })
    }
}
