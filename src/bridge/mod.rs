//! The bridge facade: one owned instance tying the handle table, the
//! finalization queue and the native collaborator together.
//!
//! All public entry points run to completion on the owning thread. Reclaim
//! notifications are delivered only at the drain points (after `release`,
//! `reset`, calls, and on [`Bridge::collect_garbage`]), never in the middle of
//! an operation.

use std::rc::Rc;

use crate::{
    handles::{Handle, HandleTable, NativePointer, TableStats},
    runtime::value::HostValue,
};

pub mod api;
pub mod config;
pub mod error;
pub mod native;
pub mod trampoline;

use config::BridgeConfig;
use error::BridgeResult;
use native::NativeRuntime;

pub struct Bridge {
    table: HandleTable,
    native: Rc<dyn NativeRuntime>,
    global: HostValue,
}

impl Bridge {
    pub fn new(native: Rc<dyn NativeRuntime>) -> Self {
        Self::with_config(BridgeConfig::default(), native)
    }

    pub fn with_config(config: BridgeConfig, native: Rc<dyn NativeRuntime>) -> Self {
        tracing::debug!("creating bridge with {:?}", config);
        Self {
            table: HandleTable::with_config(&config),
            native,
            global: HostValue::new_object(),
        }
    }

    pub fn table(&self) -> &HandleTable {
        &self.table
    }

    pub fn register(&mut self, value: &HostValue) -> BridgeResult<Handle> {
        self.table.register(value)
    }

    pub fn resolve(&self, handle: Handle) -> BridgeResult<&HostValue> {
        self.table.resolve(handle)
    }

    pub fn ref_value(&mut self, value: &HostValue) -> BridgeResult<Handle> {
        self.table.ref_value(value)
    }

    pub fn acquire(&mut self, handle: Handle) -> BridgeResult<Handle> {
        self.table.acquire(handle)
    }

    pub fn release(&mut self, handle: Handle) -> BridgeResult<()> {
        self.table.release(handle)?;
        self.process_finalizations();
        Ok(())
    }

    pub fn ref_count(&self, handle: Handle) -> BridgeResult<u32> {
        self.table.ref_count(handle)
    }

    pub fn set_error(&mut self, handle: Handle, state: bool) -> BridgeResult<()> {
        self.table.set_error(handle, state)
    }

    pub fn has_error(&self, handle: Handle) -> BridgeResult<bool> {
        self.table.has_error(handle)
    }

    pub fn set_native_handle(
        &mut self,
        handle: Handle,
        native_handle: usize,
        free_cb: usize,
    ) -> BridgeResult<()> {
        self.table.set_native_handle(handle, native_handle, free_cb)
    }

    pub fn native_handle(&self, handle: Handle) -> BridgeResult<Option<usize>> {
        self.table.native_handle(handle)
    }

    pub fn set_native_pointer(&mut self, handle: Handle, ptr: usize, info: usize) -> BridgeResult<()> {
        self.table.set_native_pointer(handle, ptr, info)
    }

    pub fn native_pointer(&self, handle: Handle) -> BridgeResult<Option<NativePointer>> {
        self.table.native_pointer(handle)
    }

    /// Tears down every handle for VM reinitialization.
    ///
    /// Not safe while native code still expects its handles to stay valid.
    pub fn reset(&mut self) {
        // Reclaims queued before the reset still carry valid handles.
        self.process_finalizations();
        self.table.reset();
        self.process_finalizations();
    }

    /// Delivers pending reclaim notifications; returns how many reached
    /// native code.
    pub fn collect_garbage(&mut self) -> usize {
        self.process_finalizations()
    }

    pub(crate) fn process_finalizations(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(freed) = self.table.take_finalized() {
            if !freed.has_native_attachment() {
                tracing::trace!("handle {} reclaimed without attachments", freed.handle);
                continue;
            }
            tracing::debug!("notifying native side of reclaimed handle {}", freed.handle);
            self.native.notify_native_object_freed(&freed);
            delivered += 1;
        }
        delivered
    }

    pub fn stats(&self) -> TableStats {
        self.table.stats()
    }
}
