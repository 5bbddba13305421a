//! Drag-and-drop reordering
//!
//! A [`ReorderBoard`] holds one ordered collection (the creator's courses,
//! the modules of a course, or the lessons of a module). Moves are applied
//! locally and written to the request cache at once. The changed positions
//! collect in a pending batch that is only sent when the creator persists
//! the order. A failed persist keeps both the local order and the batch, so
//! the creator can retry or roll back to the last confirmed order.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::api::{ApiClient, ApiError};
use crate::cache::{QueryCache, QueryKey};
use crate::models::{MessageResponse, OrderUpdate, Ordered};

use super::notify::Notifier;
use super::ServiceError;

/// Which ordered collection a board edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Courses,
    Modules { course_id: i64 },
    Lessons { module_id: i64 },
}

impl Collection {
    pub fn cache_key(&self) -> QueryKey {
        match *self {
            Collection::Courses => QueryKey::Courses,
            Collection::Modules { course_id } => QueryKey::Modules(course_id),
            Collection::Lessons { module_id } => QueryKey::Lessons(module_id),
        }
    }

    async fn send(&self, api: &ApiClient, batch: &[OrderUpdate]) -> Result<MessageResponse, ApiError> {
        match self {
            Collection::Courses => api.update_course_order(batch).await,
            Collection::Modules { .. } => api.update_module_order(batch).await,
            Collection::Lessons { .. } => api.update_lesson_order(batch).await,
        }
    }
}

/// Move the item whose order is `active` to the index of the item whose
/// order is `over`, then renumber every item to its 1-based index.
///
/// Returns the `{id, order}` pairs whose order changed, or `None` when the
/// move is a no-op (same key, or a key no item carries).
pub fn apply_move<T: Ordered>(items: &mut Vec<T>, active: i32, over: i32) -> Option<Vec<OrderUpdate>> {
    if active == over {
        return None;
    }

    let from = items.iter().position(|item| item.order() == active)?;
    let to = items.iter().position(|item| item.order() == over)?;

    let moved = items.remove(from);
    items.insert(to, moved);

    let mut changed = Vec::new();
    for (index, item) in items.iter_mut().enumerate() {
        let order = index as i32 + 1;
        if item.order() != order {
            item.set_order(order);
            changed.push(OrderUpdate::new(item.id(), order));
        }
    }

    Some(changed)
}

/// One ordered collection with its pending order batch
pub struct ReorderBoard<T> {
    collection: Collection,
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    notifier: Arc<Notifier>,
    items: Vec<T>,
    confirmed: Vec<T>,
    pending: BTreeMap<i64, i32>,
}

impl<T> std::fmt::Debug for ReorderBoard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReorderBoard")
            .field("collection", &self.collection)
            .field("items", &self.items.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl<T> ReorderBoard<T>
where
    T: Ordered + Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// Start a board from the server's current ordering
    pub fn new(
        collection: Collection,
        mut items: Vec<T>,
        api: Arc<ApiClient>,
        cache: Arc<QueryCache>,
        notifier: Arc<Notifier>,
    ) -> Self {
        items.sort_by_key(|item| item.order());
        Self {
            collection,
            api,
            cache,
            notifier,
            confirmed: items.clone(),
            items,
            pending: BTreeMap::new(),
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Pending order batch, sorted by id
    pub fn pending(&self) -> Vec<OrderUpdate> {
        self.pending
            .iter()
            .map(|(&id, &order)| OrderUpdate::new(id, order))
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Handle a drag-end event. Returns whether anything moved.
    pub async fn move_item(&mut self, active: i32, over: i32) -> Result<bool, ServiceError> {
        let Some(changed) = apply_move(&mut self.items, active, over) else {
            return Ok(false);
        };

        debug!("Moved {} onto {} in {:?}", active, over, self.collection);

        for update in changed {
            self.pending.insert(update.id, update.order);
        }

        self.cache.set(&self.collection.cache_key(), &self.items).await?;
        Ok(true)
    }

    /// Send the pending batch in one request
    ///
    /// Returns `Ok(None)` without a request when nothing is pending.
    pub async fn persist(&mut self) -> Result<Option<MessageResponse>, ServiceError> {
        if self.pending.is_empty() {
            return Ok(None);
        }

        let batch = self.pending();
        let response = self
            .collection
            .send(&self.api, &batch)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.pending.clear();
        self.confirmed = self.items.clone();
        self.notifier.success(response.message.clone());
        Ok(Some(response))
    }

    /// Restore the last server-confirmed order and drop the pending batch
    pub async fn rollback(&mut self) -> Result<(), ServiceError> {
        self.items = self.confirmed.clone();
        self.pending.clear();
        self.cache.set(&self.collection.cache_key(), &self.items).await?;
        Ok(())
    }
}
