//! Handle table telemetry.

use serde::Serialize;

/// Point-in-time summary of handle table state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Entries currently addressable by handle.
    pub live_entries: usize,
    /// Live entries for objects and functions.
    pub reference_entries: usize,
    /// Live entries for primitives. These are never removed before a reset.
    pub primitive_entries: usize,
    /// Primitive entries whose ref count already dropped to zero.
    pub leaked_primitives: usize,
    /// Back-references currently kept, live or dormant.
    pub back_refs: usize,
    /// Back-references without a live entry. In
    /// [`FinalizationMode::Disabled`](crate::finalization::FinalizationMode::Disabled)
    /// this also counts every reclaimed value, since nothing prunes them.
    pub dormant_back_refs: usize,
    /// Next handle number the counter will hand out.
    pub next_handle: u64,
    pub total_registrations: usize,
    pub total_releases: usize,
    /// Reclaim notifications queued but not yet delivered.
    pub pending_finalizations: usize,
}

impl TableStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
