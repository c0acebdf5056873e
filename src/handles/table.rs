use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    bridge::{
        config::BridgeConfig,
        error::{BridgeError, BridgeResult},
    },
    finalization::{FinalizationMode, FinalizationQueue, FreedObject, ReclaimWatch},
    handles::{
        entry::Entry,
        handle::Handle,
        internal_props::{InternalProps, NativeHandle, NativePointer},
        stats::TableStats,
    },
    runtime::{
        object_header::{ObjectHeader, ObjectId},
        value::{HostValue, PrimitiveKey, TrackingKey},
    },
};

/// Bidirectional map between handles and host values, with native-side
/// reference counts.
///
/// Reference types are found again through a back-reference side map keyed by
/// [`ObjectId`]; primitives through a value index in which NaN matches NaN.
/// Entries of reference types are removed when their count reaches zero,
/// which lets the value be reclaimed. Primitive entries stay until
/// [`Self::reset`], so a primitive keeps its handle for the table's lifetime.
pub struct HandleTable {
    entries: HashMap<Handle, Entry>,
    back_refs: HashMap<ObjectId, Rc<RefCell<InternalProps>>>,
    primitives: HashMap<PrimitiveKey, Handle>,
    next_handle: u64,
    handle_limit: u32,
    warn_on_over_release: bool,
    finalizer: Option<Rc<FinalizationQueue>>,
    total_registrations: usize,
    total_releases: usize,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    /// Creates a table with default settings.
    pub fn new() -> Self {
        Self::with_config(&BridgeConfig::default())
    }

    pub fn with_config(config: &BridgeConfig) -> Self {
        let finalizer = match config.finalization {
            FinalizationMode::Deterministic => Some(Rc::new(FinalizationQueue::new())),
            FinalizationMode::Disabled => {
                tracing::warn!(
                    "finalization disabled: native free callbacks will never fire \
                     and reclaimed values keep their back-references"
                );
                None
            }
        };

        Self {
            entries: HashMap::new(),
            back_refs: HashMap::new(),
            primitives: HashMap::new(),
            next_handle: u64::from(Handle::FIRST.0),
            handle_limit: config.handle_limit,
            warn_on_over_release: config.warn_on_over_release,
            finalizer,
            total_registrations: 0,
            total_releases: 0,
        }
    }

    /// Tracks `value` and returns its handle with one more native holder.
    ///
    /// - a live entry is reused and its count incremented;
    /// - a dormant back-reference (entry removed, value still alive) is
    ///   re-inserted under its previous handle with a count of 1;
    /// - otherwise the next handle is allocated with a count of 1, and for
    ///   reference types a back-reference and a reclaim watch are installed.
    pub fn register(&mut self, value: &HostValue) -> BridgeResult<Handle> {
        let handle = match value.tracking_key() {
            TrackingKey::Reference(header) => self.register_reference(value, header)?,
            TrackingKey::Primitive(key) => self.register_primitive(value, key)?,
        };
        self.total_registrations += 1;
        Ok(handle)
    }

    /// Returns a handle for `value`, deduplicating against every value the
    /// table already tracks.
    pub fn ref_value(&mut self, value: &HostValue) -> BridgeResult<Handle> {
        let handle = self.register(value)?;
        tracing::trace!("ref {} -> handle {}", value.type_name(), handle);
        Ok(handle)
    }

    fn register_reference(
        &mut self,
        value: &HostValue,
        header: &ObjectHeader,
    ) -> BridgeResult<Handle> {
        if let Some(props) = self.back_refs.get(&header.id()) {
            let handle = props.borrow().handle;
            if let Some(entry) = self.entries.get_mut(&handle) {
                entry.ref_count += 1;
                return Ok(handle);
            }

            tracing::debug!("re-registering dormant handle {}", handle);
            let props = Rc::clone(props);
            self.entries
                .insert(handle, Entry::new(handle, value.clone(), Some(props)));
            return Ok(handle);
        }

        let handle = self.allocate_handle()?;
        let props = Rc::new(RefCell::new(InternalProps::new(handle)));

        if let Some(queue) = &self.finalizer {
            let watch = ReclaimWatch::new(Rc::clone(&props), queue);
            // A watch can already be present when the value outlived a reset.
            if let Some(previous) = header.install_watch(watch) {
                props
                    .borrow_mut()
                    .inherit_attachments(&previous.props().borrow());
            }
        }

        self.back_refs.insert(header.id(), Rc::clone(&props));
        self.entries
            .insert(handle, Entry::new(handle, value.clone(), Some(props)));
        tracing::trace!("registered {} as handle {}", header.id(), handle);
        Ok(handle)
    }

    fn register_primitive(&mut self, value: &HostValue, key: PrimitiveKey) -> BridgeResult<Handle> {
        if let Some(&handle) = self.primitives.get(&key) {
            if let Some(entry) = self.entries.get_mut(&handle) {
                debug_assert!(entry.value.tracking_equals(value));
                entry.ref_count += 1;
                return Ok(handle);
            }
        }

        let handle = self.allocate_handle()?;
        self.primitives.insert(key, handle);
        self.entries
            .insert(handle, Entry::new(handle, value.clone(), None));
        Ok(handle)
    }

    fn allocate_handle(&mut self) -> BridgeResult<Handle> {
        if self.next_handle > u64::from(self.handle_limit) {
            return Err(BridgeError::HandleSpaceExhausted {
                limit: self.handle_limit,
            });
        }
        let handle = Handle(self.next_handle as u32);
        self.next_handle += 1;
        Ok(handle)
    }

    /// Returns the handle of a tracked value without touching its count.
    pub fn find(&self, value: &HostValue) -> Option<Handle> {
        match value.tracking_key() {
            TrackingKey::Reference(header) => self
                .back_refs
                .get(&header.id())
                .map(|props| props.borrow().handle)
                .filter(|handle| self.entries.contains_key(handle)),
            TrackingKey::Primitive(key) => self.primitives.get(&key).copied(),
        }
    }

    pub fn entry(&self, handle: Handle) -> BridgeResult<&Entry> {
        self.entries
            .get(&handle)
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    fn entry_mut(&mut self, handle: Handle) -> BridgeResult<&mut Entry> {
        self.entries
            .get_mut(&handle)
            .ok_or(BridgeError::UnknownHandle(handle))
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle)
    }

    pub fn resolve(&self, handle: Handle) -> BridgeResult<&HostValue> {
        Ok(&self.entry(handle)?.value)
    }

    /// Adds a native holder to `handle` and returns the same handle.
    pub fn acquire(&mut self, handle: Handle) -> BridgeResult<Handle> {
        self.entry_mut(handle)?.ref_count += 1;
        Ok(handle)
    }

    /// Drops a native holder from `handle`.
    ///
    /// At zero the entry of an object or function is removed; releasing the
    /// last strong reference lets the value be reclaimed. Primitive entries
    /// stay resolvable. Releasing a handle whose count is already zero is
    /// logged and leaves the count at zero.
    pub fn release(&mut self, handle: Handle) -> BridgeResult<()> {
        let warn_on_over_release = self.warn_on_over_release;
        let entry = self.entry_mut(handle)?;
        if entry.ref_count == 0 {
            if warn_on_over_release {
                tracing::warn!("release of handle {} with zero ref count", handle);
            }
        } else {
            entry.ref_count -= 1;
        }
        let remove = entry.ref_count == 0 && entry.is_removable();

        self.total_releases += 1;
        if remove {
            tracing::trace!("removing entry for handle {}", handle);
            self.entries.remove(&handle);
        }
        Ok(())
    }

    pub fn ref_count(&self, handle: Handle) -> BridgeResult<u32> {
        Ok(self.entry(handle)?.ref_count)
    }

    pub fn set_error(&mut self, handle: Handle, state: bool) -> BridgeResult<()> {
        self.entry_mut(handle)?.error = state;
        Ok(())
    }

    pub fn has_error(&self, handle: Handle) -> BridgeResult<bool> {
        Ok(self.entry(handle)?.error)
    }

    /// Attaches a native handle and its free callback to the value of
    /// `handle`, replacing any previous one. No-op for primitives.
    pub fn set_native_handle(
        &mut self,
        handle: Handle,
        native_handle: usize,
        free_cb: usize,
    ) -> BridgeResult<()> {
        match &self.entry(handle)?.props {
            Some(props) => {
                props.borrow_mut().native_handle = Some(NativeHandle {
                    handle: native_handle,
                    free_cb,
                });
            }
            None => tracing::trace!("ignoring native handle on primitive handle {}", handle),
        }
        Ok(())
    }

    pub fn native_handle(&self, handle: Handle) -> BridgeResult<Option<usize>> {
        Ok(self
            .entry(handle)?
            .props
            .as_ref()
            .and_then(|props| props.borrow().native_handle)
            .map(|native| native.handle))
    }

    /// Attaches a native pointer and its type info to the value of `handle`,
    /// replacing any previous one. No-op for primitives.
    pub fn set_native_pointer(
        &mut self,
        handle: Handle,
        ptr: usize,
        info: usize,
    ) -> BridgeResult<()> {
        match &self.entry(handle)?.props {
            Some(props) => {
                props.borrow_mut().native_pointer = Some(NativePointer { ptr, info });
            }
            None => tracing::trace!("ignoring native pointer on primitive handle {}", handle),
        }
        Ok(())
    }

    pub fn native_pointer(&self, handle: Handle) -> BridgeResult<Option<NativePointer>> {
        Ok(self
            .entry(handle)?
            .props
            .as_ref()
            .and_then(|props| props.borrow().native_pointer))
    }

    /// Drops every entry, back-reference and primitive and restarts the
    /// counter at 1.
    ///
    /// Outstanding native handles become invalid. Values that survive the
    /// reset through host references keep their reclaim watch, and their
    /// attachments carry over if they are registered again. Until then their
    /// props name [`Handle::NULL`], since the old number will be handed out
    /// again; a later reclaim is reported with a null handle.
    pub fn reset(&mut self) {
        tracing::debug!(
            "resetting handle table ({} entries, {} back-references)",
            self.entries.len(),
            self.back_refs.len()
        );
        // Values only the table held are reclaimed here, under their old handle.
        self.entries.clear();
        for props in self.back_refs.values() {
            props.borrow_mut().handle = Handle::NULL;
        }
        self.back_refs.clear();
        self.primitives.clear();
        self.next_handle = u64::from(Handle::FIRST.0);
    }

    /// Pops the next reclaim notification and forgets the reclaimed value's
    /// back-reference.
    pub fn take_finalized(&mut self) -> Option<FreedObject> {
        let freed = self.finalizer.as_ref()?.pop()?;
        self.back_refs.remove(&freed.object_id);
        Some(freed)
    }

    pub fn pending_finalizations(&self) -> usize {
        self.finalizer.as_ref().map_or(0, |queue| queue.len())
    }

    pub fn finalization_mode(&self) -> FinalizationMode {
        match self.finalizer {
            Some(_) => FinalizationMode::Deterministic,
            None => FinalizationMode::Disabled,
        }
    }

    /// Returns the number of live entries.
    pub fn live_count(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> TableStats {
        let reference_entries = self
            .entries
            .values()
            .filter(|entry| entry.is_removable())
            .count();
        let leaked_primitives = self
            .entries
            .values()
            .filter(|entry| !entry.is_removable() && entry.ref_count == 0)
            .count();
        let dormant_back_refs = self
            .back_refs
            .values()
            .filter(|props| !self.entries.contains_key(&props.borrow().handle))
            .count();

        TableStats {
            back_refs: self.back_refs.len(),
            live_entries: self.entries.len(),
            reference_entries,
            primitive_entries: self.entries.len() - reference_entries,
            leaked_primitives,
            dormant_back_refs,
            next_handle: self.next_handle,
            total_registrations: self.total_registrations,
            total_releases: self.total_releases,
            pending_finalizations: self.pending_finalizations(),
        }
    }
}
