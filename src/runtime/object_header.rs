use std::{
    cell::RefCell,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::finalization::ReclaimWatch;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Runtime-assigned identity of a reference-type host value.
///
/// Ids come from a process-wide counter and are never reused, so a stale id
/// can never alias a newer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity plus reclaim hook shared by every reference-type host value.
///
/// The header carries at most one [`ReclaimWatch`]. Dropping the header (that
/// is, dropping the last strong reference to the value) fires the watch, so a
/// value can report its reclaim at most once.
pub struct ObjectHeader {
    id: ObjectId,
    watch: RefCell<Option<ReclaimWatch>>,
}

impl Default for ObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectHeader {
    pub fn new() -> Self {
        Self {
            id: ObjectId::next(),
            watch: RefCell::new(None),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns `true` while a reclaim watch is installed.
    pub fn is_watched(&self) -> bool {
        self.watch.borrow().is_some()
    }

    /// Installs `watch`, returning the watch it replaces.
    ///
    /// The replaced watch is handed back unfired; the caller decides what to
    /// carry over from it.
    pub(crate) fn install_watch(&self, watch: ReclaimWatch) -> Option<ReclaimWatch> {
        self.watch.borrow_mut().replace(watch)
    }
}

impl fmt::Debug for ObjectHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeader")
            .field("id", &self.id)
            .field("watched", &self.is_watched())
            .finish()
    }
}

impl Drop for ObjectHeader {
    fn drop(&mut self) {
        if let Some(watch) = self.watch.get_mut().take() {
            watch.fire(self.id);
        }
    }
}
