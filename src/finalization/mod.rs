//! Reclaim observation for reference-type host values.
//!
//! A [`ReclaimWatch`] is installed in a value's object header when the value
//! is first registered. When the last strong reference to the value drops,
//! the watch snapshots the value's internal props into a [`FreedObject`] and
//! queues it on the [`FinalizationQueue`]. The bridge drains the queue at its
//! own drain points, so native code only ever sees notifications between
//! operations, never in the middle of one.
//!
//! The watch holds the props and a weak reference to the queue, never the
//! value, so installing it does not extend the value's lifetime.

mod freed_object;
mod queue;
mod watch;

pub use freed_object::FreedObject;
pub use queue::FinalizationQueue;
pub use watch::ReclaimWatch;

use serde::Deserialize;

/// Whether reclaim watches are installed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizationMode {
    /// Reclaim is reported when the last strong reference drops.
    #[default]
    Deterministic,
    /// No watches are installed. Native free callbacks never fire, and
    /// back-references of reclaimed values are never pruned: the table keeps
    /// one back-reference per object ever registered until the next reset.
    /// `TableStats::back_refs` and `dormant_back_refs` show the growth.
    Disabled,
}
