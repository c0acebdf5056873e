//! Outward boundary: the calls this crate makes into native code.

use crate::{
    bridge::{Bridge, trampoline::ArgBuffer},
    finalization::FreedObject,
    handles::Handle,
};

/// Address of a native external handler, as handed over by native code.
pub type FunctionPtr = usize;

/// Arguments of one trampoline call, in native calling order.
#[derive(Debug)]
pub struct ExternalCall<'a> {
    /// Native handler the host function was created for.
    pub function_ptr: FunctionPtr,
    /// Handle of the host function value itself.
    pub function: Handle,
    /// Handle of the call-time receiver.
    pub this: Handle,
    /// Packed argument handles, in call order.
    pub args: &'a ArgBuffer,
}

impl ExternalCall<'_> {
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Returns the argument handle at `index`, if present.
    pub fn arg(&self, index: usize) -> Option<Handle> {
        self.args.get(index)
    }
}

/// Native collaborator of the bridge.
///
/// Implementations typically wrap FFI entry points; methods take `&self` so
/// the bridge can call them while lending itself out mutably.
pub trait NativeRuntime {
    /// Runs the native handler behind an external function.
    ///
    /// The handles in `call` stay valid for the duration of the call and are
    /// released by the bridge afterwards. The returned handle must be owned by
    /// the caller (freshly referenced), with its error flag set if the handler
    /// failed; the bridge releases it once its value is extracted.
    fn invoke_external_handler(&self, bridge: &mut Bridge, call: &ExternalCall<'_>) -> Handle;

    /// Delivered once for each reclaimed value that carries a native
    /// attachment.
    fn notify_native_object_freed(&self, freed: &FreedObject);
}
