//! Ordering primitives shared by courses, modules and lessons

use serde::{Deserialize, Serialize};

/// One entry of an order batch: entity `id` now sits at 1-based position `order`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub id: i64,
    pub order: i32,
}

impl OrderUpdate {
    pub fn new(id: i64, order: i32) -> Self {
        Self { id, order }
    }
}

/// An entity that occupies a position inside its parent collection.
///
/// The position (`order`) doubles as the drag key: a move event names the
/// dragged item and the drop target by their current order values.
pub trait Ordered {
    fn id(&self) -> i64;
    fn order(&self) -> i32;
    fn set_order(&mut self, order: i32);
}

/// Generic `{ "message": ... }` body returned by most mutations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
