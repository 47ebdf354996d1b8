//! Client-side ordering helpers.
//!
//! - [`change_order`] turns a sequence into `(id, order)` pairs and sends
//!   them as one batch.
//! - [`renumber`] / [`save_sequence`] handle drag-and-drop: array position
//!   becomes the order value.
//! - [`move_up`] / [`move_down`] swap the order values of two neighbours.
//! - [`OrderedList`] wraps a local sequence: it applies a change
//!   optimistically, persists it, and on failure marks itself stale and
//!   emits [`OrderEvent::Resync`] so the owner re-fetches.
//!
//! The transport is abstracted by [`OrderSink`]; [`PlanboardClient`] is the
//! HTTP implementation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::{ClientError, PlanboardClient};
use crate::models::{OrderEntry, Orderable, Resource};

/// Destination for reorder batches.
pub trait OrderSink {
    fn send_order(
        &self,
        resource: Resource,
        entries: &[OrderEntry],
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

impl OrderSink for PlanboardClient {
    async fn send_order(&self, resource: Resource, entries: &[OrderEntry]) -> Result<(), ClientError> {
        self.update_order(resource, entries).await.map(|_| ())
    }
}

/// Pair every item's id with its order value, keeping sequence order.
pub fn order_entries<T>(
    items: &[T],
    id_of: impl Fn(&T) -> String,
    order_of: impl Fn(&T) -> i64,
) -> Vec<OrderEntry> {
    items
        .iter()
        .map(|item| OrderEntry {
            id: id_of(item),
            order: order_of(item),
        })
        .collect()
}

/// Persist the order values of a sequence as a single batch request.
///
/// The local sequence is never rolled back here; on error the caller
/// decides how to resynchronize.
pub async fn change_order<T, S: OrderSink>(
    sink: &S,
    resource: Resource,
    items: &[T],
    id_of: impl Fn(&T) -> String,
    order_of: impl Fn(&T) -> i64,
) -> Result<(), ClientError> {
    let entries = order_entries(items, id_of, order_of);
    tracing::debug!("Sending {} {} order entries", entries.len(), resource);
    sink.send_order(resource, &entries).await
}

/// Assign `order = index` to every item.
pub fn renumber<T: Orderable>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index as i64);
    }
}

/// Renumber a rearranged sequence by position and persist it.
pub async fn save_sequence<T: Orderable, S: OrderSink>(
    sink: &S,
    resource: Resource,
    items: &mut [T],
) -> Result<(), ClientError> {
    renumber(items);
    change_order(sink, resource, items, T::order_id, T::order).await
}

/// The sequence after moving `id` one place up, or `None` if it is already
/// first or not present.
pub fn plan_move_up<T: Orderable + Clone>(items: &[T], id: &str) -> Option<Vec<T>> {
    let index = position_of(items, id)?;
    if index == 0 {
        return None;
    }
    Some(swapped(items, index, index - 1))
}

/// The sequence after moving `id` one place down, or `None` if it is already
/// last or not present.
pub fn plan_move_down<T: Orderable + Clone>(items: &[T], id: &str) -> Option<Vec<T>> {
    let index = position_of(items, id)?;
    if index + 1 >= items.len() {
        return None;
    }
    Some(swapped(items, index, index + 1))
}

fn position_of<T: Orderable>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|item| item.order_id() == id)
}

/// Swap the order values of two items and their positions.
fn swapped<T: Orderable + Clone>(items: &[T], a: usize, b: usize) -> Vec<T> {
    let mut next = items.to_vec();
    let order_a = next[a].order();
    let order_b = next[b].order();
    next[a].set_order(order_b);
    next[b].set_order(order_a);
    next.swap(a, b);
    next
}

/// Move an item up and persist. At the top (or unknown id) this returns the
/// input unchanged and sends nothing.
pub async fn move_up<T: Orderable + Clone, S: OrderSink>(
    sink: &S,
    resource: Resource,
    items: &[T],
    id: &str,
) -> Result<Vec<T>, ClientError> {
    match plan_move_up(items, id) {
        Some(next) => {
            change_order(sink, resource, &next, T::order_id, T::order).await?;
            Ok(next)
        }
        None => Ok(items.to_vec()),
    }
}

/// Move an item down and persist. At the bottom (or unknown id) this returns
/// the input unchanged and sends nothing.
pub async fn move_down<T: Orderable + Clone, S: OrderSink>(
    sink: &S,
    resource: Resource,
    items: &[T],
    id: &str,
) -> Result<Vec<T>, ClientError> {
    match plan_move_down(items, id) {
        Some(next) => {
            change_order(sink, resource, &next, T::order_id, T::order).await?;
            Ok(next)
        }
        None => Ok(items.to_vec()),
    }
}

// ============================================================
// Ordered list store
// ============================================================

/// Notifications emitted by an [`OrderedList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    /// A change was persisted.
    Saved { resource: Resource },
    /// Persisting failed; local state is stale and must be re-fetched.
    Resync { resource: Resource, reason: String },
}

/// Shared view of whether an [`OrderedList`] has a batch in flight.
///
/// Obtained with [`OrderedList::saving_flag`]; it stays readable while the
/// list itself is mutably borrowed by a save.
#[derive(Debug, Clone, Default)]
pub struct SavingFlag(Arc<AtomicBool>);

impl SavingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn raise(&self) -> SavingGuard {
        self.0.store(true, Ordering::Release);
        SavingGuard(self.clone())
    }
}

/// Lowers the flag when the save completes or its future is dropped.
struct SavingGuard(SavingFlag);

impl Drop for SavingGuard {
    fn drop(&mut self) {
        self.0 .0.store(false, Ordering::Release);
    }
}

/// A locally held, user-ordered sequence of one resource.
pub struct OrderedList<T> {
    resource: Resource,
    items: Vec<T>,
    saving: SavingFlag,
    stale: bool,
    events: mpsc::UnboundedSender<OrderEvent>,
}

impl<T: Orderable + Clone> OrderedList<T> {
    pub fn new(resource: Resource, items: Vec<T>) -> (Self, mpsc::UnboundedReceiver<OrderEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let list = Self {
            resource,
            items,
            saving: SavingFlag::default(),
            stale: false,
            events,
        };
        (list, rx)
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// True while a batch is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.is_set()
    }

    /// A handle that observes [`is_saving`](Self::is_saving) from outside
    /// the borrow held by a pending save.
    pub fn saving_flag(&self) -> SavingFlag {
        self.saving.clone()
    }

    /// True after a failed save, until [`OrderedList::resync`] is called.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns `Ok(false)` when the move is a no-op.
    pub async fn move_up<S: OrderSink>(&mut self, sink: &S, id: &str) -> Result<bool, ClientError> {
        match plan_move_up(&self.items, id) {
            Some(next) => self.commit(sink, next).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Returns `Ok(false)` when the move is a no-op.
    pub async fn move_down<S: OrderSink>(&mut self, sink: &S, id: &str) -> Result<bool, ClientError> {
        match plan_move_down(&self.items, id) {
            Some(next) => self.commit(sink, next).await.map(|_| true),
            None => Ok(false),
        }
    }

    /// Replace the sequence with a rearranged one (drag and drop) and persist
    /// it with positions as order values.
    pub async fn rearrange<S: OrderSink>(
        &mut self,
        sink: &S,
        mut items: Vec<T>,
    ) -> Result<(), ClientError> {
        renumber(&mut items);
        self.commit(sink, items).await
    }

    async fn commit<S: OrderSink>(&mut self, sink: &S, next: Vec<T>) -> Result<(), ClientError> {
        self.items = next;
        let saving = self.saving.raise();
        let result = change_order(sink, self.resource, &self.items, T::order_id, T::order).await;
        drop(saving);

        let event = match &result {
            Ok(()) => OrderEvent::Saved {
                resource: self.resource,
            },
            Err(e) => {
                tracing::warn!("Failed to save {} order, resync required: {}", self.resource, e);
                self.stale = true;
                OrderEvent::Resync {
                    resource: self.resource,
                    reason: e.to_string(),
                }
            }
        };
        if self.events.send(event).is_err() {
            tracing::debug!("No listener for {} order events", self.resource);
        }

        result
    }

    /// Replace local state with a freshly fetched sequence.
    pub fn resync(&mut self, items: Vec<T>) {
        self.items = items;
        self.stale = false;
    }

    /// Fetch the authoritative sequence and [`resync`](Self::resync) to it.
    pub async fn refresh<F, Fut>(&mut self, fetch: F) -> Result<(), ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, ClientError>>,
    {
        let items = fetch().await?;
        self.resync(items);
        Ok(())
    }
}
