//! Price level implementation with FIFO queue
//!
//! A price level contains all open orders of one side at a specific price.
//! Orders are kept in insertion order, which is creation order because the
//! store stamps `created_at` monotonically under the pair lock. The front
//! entry is therefore the time-priority winner at this price.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::numeric::Quantity;

/// A price level containing orders at a specific price
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<OrderEntry>,
    /// Sum of remaining quantity across the queue
    total_quantity: Quantity,
}

#[derive(Debug, Clone)]
struct OrderEntry {
    order_id: OrderId,
    remaining_quantity: Quantity,
}

impl PriceLevel {
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_quantity: Quantity::zero(),
        }
    }

    /// Insert an order at the back of the queue (time priority)
    ///
    /// Returns false, leaving the level untouched, if the level total
    /// would leave `Decimal` range.
    pub fn insert(&mut self, order_id: OrderId, quantity: Quantity) -> bool {
        let Some(total) = self.total_quantity.checked_add(quantity) else {
            return false;
        };
        self.orders.push_back(OrderEntry {
            order_id,
            remaining_quantity: quantity,
        });
        self.total_quantity = total;
        true
    }

    /// Remove an order from the queue by OrderId
    ///
    /// Returns the remaining quantity of the removed order, or None if not found
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Quantity> {
        let position = self.position(order_id)?;
        let entry = self.orders.remove(position)?;
        self.total_quantity = self.total_without(entry.remaining_quantity);
        Some(entry.remaining_quantity)
    }

    /// Peek at the front order without removing it
    pub fn peek_front(&self) -> Option<(OrderId, Quantity)> {
        self.orders
            .front()
            .map(|entry| (entry.order_id, entry.remaining_quantity))
    }

    /// Set the remaining quantity of a queued order
    ///
    /// A zero quantity removes the entry. The entry keeps its queue position
    /// otherwise, so a partial fill never loses time priority. Returns false
    /// for an unknown order or a total that would leave `Decimal` range.
    pub fn update_quantity(&mut self, order_id: &OrderId, new_quantity: Quantity) -> bool {
        let Some(position) = self.position(order_id) else {
            return false;
        };

        if new_quantity.is_zero() {
            return self.remove(order_id).is_some();
        }

        let old_quantity = self.orders[position].remaining_quantity;
        let Some(total) = self.total_without(old_quantity).checked_add(new_quantity) else {
            return false;
        };
        self.orders[position].remaining_quantity = new_quantity;
        self.total_quantity = total;
        true
    }

    /// Order ids in time priority
    pub fn order_ids(&self) -> impl Iterator<Item = OrderId> + '_ {
        self.orders.iter().map(|entry| entry.order_id)
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total quantity at this price level
    pub fn total_quantity(&self) -> Quantity {
        self.total_quantity
    }

    fn position(&self, order_id: &OrderId) -> Option<usize> {
        self.orders.iter().position(|entry| &entry.order_id == order_id)
    }

    fn total_without(&self, quantity: Quantity) -> Quantity {
        let rest = self.total_quantity.checked_sub(quantity);
        debug_assert!(rest.is_some(), "level total is below one of its entries");
        rest.unwrap_or_else(Quantity::zero)
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
