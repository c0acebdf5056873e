use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
};

use crate::finalization::FreedObject;

/// Pending reclaim notifications, filled from `Drop` and drained by the
/// bridge.
///
/// Pushing never touches the handle table, so a value may be reclaimed in
/// the middle of a table mutation without observing it half-done.
pub struct FinalizationQueue {
    queue: RefCell<VecDeque<FreedObject>>,
    total_queued: Cell<usize>,
}

impl Default for FinalizationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl FinalizationQueue {
    pub fn new() -> Self {
        Self {
            queue: RefCell::new(VecDeque::with_capacity(8)),
            total_queued: Cell::new(0),
        }
    }

    pub(crate) fn push(&self, freed: FreedObject) {
        tracing::trace!(
            "queued finalization for handle {} ({})",
            freed.handle,
            freed.object_id
        );
        self.queue.borrow_mut().push_back(freed);
        self.total_queued.set(self.total_queued.get() + 1);
    }

    /// Pops the oldest pending notification.
    ///
    /// The internal borrow ends before returning, so values reclaimed while
    /// the caller handles the result can still queue.
    pub fn pop(&self) -> Option<FreedObject> {
        self.queue.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Total notifications ever queued.
    pub fn total_queued(&self) -> usize {
        self.total_queued.get()
    }
}

impl fmt::Debug for FinalizationQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FinalizationQueue")
            .field("pending", &self.len())
            .field("total_queued", &self.total_queued())
            .finish()
    }
}
